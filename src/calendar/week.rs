//! Week and day data for a Monday-start calendar.
//!
//! Week numbers follow ISO 8601: weeks start on Monday and week 1 is the week
//! holding the year's first Thursday.

use chrono::{Datelike, Days, Local, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::{FeedError, Result};

const DAYS_PER_WEEK: u64 = 7;

/// One calendar day
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Day {
    /// Serialized as `YYYY-MM-DD`
    pub date: NaiveDate,
    /// English weekday name, e.g. `Monday`
    pub day_name: String,
    pub activities: u32,
    pub meals: Vec<String>,
}

impl Day {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            day_name: date.format("%A").to_string(),
            activities: 0,
            meals: Vec::new(),
        }
    }
}

/// Seven consecutive days starting on `start_date`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Week {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub week_number: u32,
    pub total_activities: u32,
    pub days: Vec<Day>,
}

impl Week {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }

    /// Add a meal to the day matching `date`. Counts as one activity.
    pub fn add_meal(&mut self, date: NaiveDate, meal: impl Into<String>) -> Result<()> {
        let day = self
            .days
            .iter_mut()
            .find(|d| d.date == date)
            .ok_or_else(|| FeedError::InvalidDate(format!("{} is not in week {}", date, self.week_number)))?;
        day.meals.push(meal.into());
        day.activities += 1;
        self.total_activities += 1;
        Ok(())
    }
}

/// ISO 8601 week number of `date`
pub fn week_number(date: NaiveDate) -> u32 {
    date.iso_week().week()
}

/// Monday on or before `date`. A Sunday maps to the Monday six days earlier.
pub fn start_of_week(date: NaiveDate) -> NaiveDate {
    date.week(Weekday::Mon).first_day()
}

/// Parse a `YYYY-MM-DD` date
pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| FeedError::InvalidDate(format!("{}: {}", s, e)))
}

fn add_days(date: NaiveDate, days: u64) -> Result<NaiveDate> {
    date.checked_add_days(Days::new(days))
        .ok_or_else(|| FeedError::InvalidDate(format!("{} + {} days is out of range", date, days)))
}

/// Build the week starting at `start_date`, with no activities.
pub fn generate_week_data(start_date: NaiveDate, week_number: u32) -> Result<Week> {
    let days = (0..DAYS_PER_WEEK)
        .map(|i| add_days(start_date, i).map(Day::new))
        .collect::<Result<Vec<_>>>()?;

    Ok(Week {
        start_date,
        end_date: add_days(start_date, DAYS_PER_WEEK - 1)?,
        week_number,
        total_activities: 0,
        days,
    })
}

/// Build `count` consecutive weeks, the first being the week containing `start_date`.
pub fn generate_calendar_weeks(start_date: NaiveDate, count: usize) -> Result<Vec<Week>> {
    let mut weeks = Vec::with_capacity(count);
    let mut current = start_date;

    for i in 0..count {
        let week_start = start_of_week(current);
        weeks.push(generate_week_data(week_start, week_number(week_start))?);
        if i + 1 < count {
            current = add_days(current, DAYS_PER_WEEK)?;
        }
    }

    log::debug!("Generated {} weeks from {}", weeks.len(), start_date);
    Ok(weeks)
}

/// Weeks starting with the week containing `today`
pub fn generate_calendar_weeks_from(today: NaiveDate, count: usize) -> Result<Vec<Week>> {
    generate_calendar_weeks(start_of_week(today), count)
}

/// Weeks starting with the current local week
pub fn generate_calendar_weeks_from_current(count: usize) -> Result<Vec<Week>> {
    generate_calendar_weeks_from(Local::now().date_naive(), count)
}
