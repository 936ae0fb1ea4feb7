pub mod quote;
pub mod schedule;
pub mod sidebar;

pub use quote::{QuoteClient, QuoteError};
pub use schedule::{until_next_half_hour, RefreshSchedule};
pub use sidebar::{clock_text, Sidebar, SidebarCommand, SidebarFrame, UnknownCommand};
