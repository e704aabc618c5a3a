use chrono::{Datelike, Duration, NaiveDateTime};

use mediamgr_core::{Frequency, TimeOfDay};

/// Next local wall-clock instant strictly after `from` at which a job with
/// this trigger fires.
pub fn next_fire(frequency: Frequency, time: TimeOfDay, from: NaiveDateTime) -> NaiveDateTime {
    let Some(today) = from
        .date()
        .and_hms_opt(time.hour() as u32, time.minute() as u32, 0)
    else {
        return from;
    };

    match frequency {
        Frequency::Daily => {
            if today > from {
                today
            } else {
                today + Duration::days(1)
            }
        }
        Frequency::Weekly(day) => {
            let today_dow = from.weekday().num_days_from_monday() as i64;
            let target_dow = day.num_days_from_monday() as i64;
            let days_ahead = (target_dow - today_dow).rem_euclid(7);
            let candidate = today + Duration::days(days_ahead);
            if candidate > from {
                candidate
            } else {
                // Same weekday, time already passed.
                candidate + Duration::days(7)
            }
        }
    }
}
