use dashboard_core::{FinancialStatements, Fundamentals, Statement};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompanyInfo {
    pub symbol: String,
    pub name: Option<String>,
    pub sector: Option<String>,
    pub industry: Option<String>,
    pub website: Option<String>,
    pub summary: Option<String>,
    pub market_cap: Option<f64>,
    pub employees: Option<i64>,
    pub country: Option<String>,
    pub city: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompanyFundamentals {
    pub pe: Option<f64>,
    pub forward_pe: Option<f64>,
    pub ps: Option<f64>,
    pub pb: Option<f64>,
    pub peg: Option<f64>,
    pub beta: Option<f64>,
    pub dividend_yield: Option<f64>,
    pub payout_ratio: Option<f64>,
    pub gross_margins: Option<f64>,
    pub operating_margins: Option<f64>,
    pub profit_margins: Option<f64>,
    pub revenue_ttm: Option<f64>,
    pub ebitda: Option<f64>,
    pub net_income_ttm: Option<f64>,
    pub roe: Option<f64>,
    pub roa: Option<f64>,
    pub total_debt: Option<f64>,
    pub debt_to_equity: Option<f64>,
    pub free_cash_flow: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnnualSnapshot {
    pub revenue: Option<f64>,
    pub gross_profit: Option<f64>,
    pub operating_income: Option<f64>,
    pub net_income: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BalanceSheetSnapshot {
    pub assets: Option<f64>,
    pub liabilities: Option<f64>,
    pub equity: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CashflowSnapshot {
    pub operating_cash_flow: Option<f64>,
    pub capital_expenditures: Option<f64>,
    pub free_cash_flow: Option<f64>,
}

/// Latest-period values from each financial statement.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FinancialSnapshot {
    pub annual: AnnualSnapshot,
    pub balance_sheet: BalanceSheetSnapshot,
    pub cashflow: CashflowSnapshot,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompanyReport {
    pub info: CompanyInfo,
    pub fundamentals: CompanyFundamentals,
    pub financials: FinancialSnapshot,
}

impl CompanyReport {
    pub fn build(symbol: &str, data: &Fundamentals, statements: &FinancialStatements) -> Self {
        let fundamentals = fundamentals(data);
        let financials = financials(statements, fundamentals.free_cash_flow);

        Self {
            info: info(symbol, data),
            fundamentals,
            financials,
        }
    }
}

fn info(symbol: &str, data: &Fundamentals) -> CompanyInfo {
    CompanyInfo {
        symbol: symbol.to_string(),
        name: data.first_text(&["longName", "shortName"]),
        sector: data.text("sector"),
        industry: data.text("industry"),
        website: data.text("website"),
        summary: data.text("longBusinessSummary"),
        market_cap: data.number("marketCap"),
        employees: data.integer("fullTimeEmployees"),
        country: data.text("country"),
        city: data.text("city"),
    }
}

fn fundamentals(data: &Fundamentals) -> CompanyFundamentals {
    CompanyFundamentals {
        pe: data.number("trailingPE"),
        forward_pe: data.number("forwardPE"),
        ps: data.number("priceToSalesTrailing12Months"),
        pb: data.number("priceToBook"),
        peg: data.number("pegRatio"),
        beta: data.number("beta"),
        dividend_yield: data.number("dividendYield"),
        payout_ratio: data.number("payoutRatio"),
        gross_margins: data.number("grossMargins"),
        operating_margins: data.number("operatingMargins"),
        profit_margins: data.number("profitMargins"),
        revenue_ttm: data.number("totalRevenue"),
        ebitda: data.number("ebitda"),
        net_income_ttm: data.number("netIncomeToCommon"),
        roe: data.number("returnOnEquity"),
        roa: data.number("returnOnAssets"),
        total_debt: data.number("totalDebt"),
        debt_to_equity: data.number("debtToEquity"),
        free_cash_flow: data.number("freeCashflow"),
    }
}

/// `reported_fcf` is used when operating cash flow or capex is missing.
fn financials(statements: &FinancialStatements, reported_fcf: Option<f64>) -> FinancialSnapshot {
    let income = &statements.income;
    let balance = &statements.balance_sheet;
    let cash = &statements.cash_flow;

    let operating_cash_flow = latest(
        cash,
        &["Operating Cash Flow", "totalCashFromOperatingActivities", "operatingCashFlow"],
    );
    let capital_expenditures = latest(cash, &["Capital Expenditures", "capitalExpenditures"]);

    // Capex is reported as a negative number.
    let free_cash_flow = match (operating_cash_flow, capital_expenditures) {
        (Some(ocf), Some(capex)) => Some(ocf + capex),
        _ => reported_fcf,
    };

    FinancialSnapshot {
        annual: AnnualSnapshot {
            revenue: latest(income, &["Total Revenue", "totalRevenue"]),
            gross_profit: latest(income, &["Gross Profit", "grossProfit"]),
            operating_income: latest(income, &["Operating Income", "operatingIncome"]),
            net_income: latest(income, &["Net Income", "netIncome"]),
        },
        balance_sheet: BalanceSheetSnapshot {
            assets: latest(balance, &["Total Assets", "totalAssets"]),
            liabilities: latest(
                balance,
                &["Total Liab", "Total Liabilities", "totalLiab", "totalLiabilities"],
            ),
            equity: latest(
                balance,
                &["Total Stockholder Equity", "totalStockholderEquity", "Stockholders Equity"],
            ),
        },
        cashflow: CashflowSnapshot {
            operating_cash_flow,
            capital_expenditures,
            free_cash_flow,
        },
    }
}

fn latest(statement: &Statement, candidates: &[&str]) -> Option<f64> {
    statement.latest(candidates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn apple_blob() -> Fundamentals {
        let mut f = Fundamentals::default();
        f.insert("shortName", json!("Apple"));
        f.insert("longName", json!("Apple Inc."));
        f.insert("sector", json!("Technology"));
        f.insert("fullTimeEmployees", json!(161000));
        f.insert("trailingPE", json!(29.5));
        f.insert("freeCashflow", json!(90_000.0));
        f.insert("returnOnEquity", json!(1.47));
        f
    }

    #[test]
    fn test_info_and_fundamentals_mapping() {
        let report = CompanyReport::build("AAPL", &apple_blob(), &FinancialStatements::default());

        assert_eq!(report.info.symbol, "AAPL");
        assert_eq!(report.info.name.as_deref(), Some("Apple Inc."));
        assert_eq!(report.info.employees, Some(161000));
        assert_eq!(report.info.city, None);
        assert_eq!(report.fundamentals.pe, Some(29.5));
        assert_eq!(report.fundamentals.roe, Some(1.47));
        assert_eq!(report.fundamentals.forward_pe, None);
    }

    #[test]
    fn test_free_cash_flow_from_statements() {
        let mut statements = FinancialStatements::default();
        statements
            .cash_flow
            .insert_row("Operating Cash Flow", vec![Some(110.0), Some(100.0)]);
        statements
            .cash_flow
            .insert_row("capitalExpenditures", vec![Some(-10.0)]);
        statements
            .balance_sheet
            .insert_row("totalLiab", vec![None, Some(290.0)]);

        let report = CompanyReport::build("AAPL", &apple_blob(), &statements);

        assert_eq!(report.financials.cashflow.free_cash_flow, Some(100.0));
        assert_eq!(report.financials.balance_sheet.liabilities, Some(290.0));
        assert_eq!(report.financials.annual.revenue, None);
    }

    #[test]
    fn test_free_cash_flow_falls_back_to_reported() {
        let mut statements = FinancialStatements::default();
        statements
            .cash_flow
            .insert_row("totalCashFromOperatingActivities", vec![Some(110.0)]);

        let report = CompanyReport::build("AAPL", &apple_blob(), &statements);

        assert_eq!(report.financials.cashflow.operating_cash_flow, Some(110.0));
        assert_eq!(report.financials.cashflow.capital_expenditures, None);
        assert_eq!(report.financials.cashflow.free_cash_flow, Some(90_000.0));
    }

    #[test]
    fn test_empty_inputs_serialize_as_nulls() {
        let report = CompanyReport::build("ZZZZ", &Fundamentals::default(), &FinancialStatements::default());
        let value = serde_json::to_value(&report).unwrap();

        assert_eq!(value["info"]["symbol"], "ZZZZ");
        assert!(value["info"]["name"].is_null());
        assert!(value["fundamentals"]["pe"].is_null());
        assert!(value["financials"]["cashflow"]["free_cash_flow"].is_null());
    }
}
