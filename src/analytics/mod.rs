//! Analytics
//!
//! Pure reductions over snapshots of the live collections. Nothing here
//! touches the backend; every function recomputes from scratch on the
//! rows it is given.
//!
//! - **spending**: Expense totals per category for the pie chart
//! - **monthly**: Income and expense totals per calendar month
//! - **summary**: Dashboard totals, credit card and profile statistics
//! - **format**: Currency, percentage and date display

pub mod format;
pub mod monthly;
pub mod spending;
pub mod summary;

pub use format::{format_currency, format_long_date, format_money, format_percent};
pub use monthly::{monthly_totals, MonthBucket};
pub use spending::{spending_by_category, CategorySlice, SpendingBreakdown};
pub use summary::{
    card_portfolio, card_stats, profile_stats, recent, totals, CardPortfolio, CardStats,
    ProfileStats, Totals,
};
