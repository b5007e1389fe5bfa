// Data models for the schedule core

pub mod active_schedule;
pub mod calendar;
pub mod daily_template;
pub mod schedule_item;
pub mod schedule_template;
pub mod validation;
pub mod weekly_template;
pub mod workout;

pub use active_schedule::*;
pub use calendar::*;
pub use daily_template::*;
pub use schedule_item::*;
pub use schedule_template::*;
pub use validation::*;
pub use weekly_template::*;
pub use workout::*;
