// Business logic services

pub mod active_schedule_service;
pub mod calendar_service;
pub mod daily_template_service;
pub mod errors;
pub mod recurrence;
pub mod schedule_item_service;
pub mod schedule_template_service;
pub mod template_generation_service;
pub mod weekly_template_service;
pub mod workout_store;

pub use active_schedule_service::ActiveScheduleService;
pub use calendar_service::CalendarService;
pub use daily_template_service::DailyTemplateService;
pub use errors::{ScheduleError, ScheduleResult};
pub use schedule_item_service::ScheduleItemService;
pub use schedule_template_service::ScheduleTemplateService;
pub use template_generation_service::TemplateGenerationService;
pub use weekly_template_service::WeeklyTemplateService;
pub use workout_store::WorkoutStore;
