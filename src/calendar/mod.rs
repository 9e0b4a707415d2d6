//! Calendar week data generation

pub mod week;

pub use week::{
    Day, Week, generate_calendar_weeks, generate_calendar_weeks_from, generate_calendar_weeks_from_current,
    generate_week_data, parse_date, start_of_week, week_number,
};
