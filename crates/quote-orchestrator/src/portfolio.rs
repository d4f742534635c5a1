use dashboard_core::Fundamentals;
use portfolio_diagnostics::CompanyBasics;

/// Sector (`sector`, then `industry`, else "Unknown") and P/E
/// (`trailingPE`, then `forwardPE`) from an info blob.
pub fn company_basics(info: &Fundamentals) -> CompanyBasics {
    let defaults = CompanyBasics::default();
    CompanyBasics {
        sector: info
            .first_text(&["sector", "industry"])
            .unwrap_or(defaults.sector),
        pe: info.first_number(&["trailingPE", "forwardPE"]),
    }
}
