mod member_source;
mod stop_signal;
mod ticker;
mod time;

pub use member_source::MemberSource;
pub use member_source::StaticMembers;
pub(crate) use ticker::TickerHandle;
