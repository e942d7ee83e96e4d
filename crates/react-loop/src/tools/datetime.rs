use std::fmt::Display;
use std::future::ready;
use std::sync::LazyLock;

use chrono::{
    DateTime, Days, FixedOffset, Local, NaiveDate, TimeZone, Utc,
};
use react_loop_core::tool::{Error as ToolError, Tool, ToolResult};
use regex::Regex;
use schemars::{JsonSchema, schema_for};
use serde::Deserialize;
use serde_json::Value;

const DATE_OPERATION_HELP: &str = "unrecognized operation, try one of:\n\
    • in 7 days\n\
    • 30 days ago\n\
    • days until 2026-12-31\n\
    • days since 2020-01-01\n\
    • in 2 weeks\n\
    • in 3 months";

static UTC_OFFSET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:utc|gmt)?\s*([+-])(\d{1,2})(?::?(\d{2}))?$")
        .expect("offset pattern is valid")
});

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum DateOperation {
    DaysAhead,
    DaysAgo,
    DaysUntil,
    DaysSince,
    WeeksAhead,
    MonthsAhead,
}

static DATE_OPERATIONS: LazyLock<Vec<(DateOperation, Regex)>> =
    LazyLock::new(|| {
        [
            (DateOperation::DaysAhead, r"\bin\s*(\d+)\s*days?\b"),
            (DateOperation::DaysAgo, r"\b(\d+)\s*days?\s*ago\b"),
            (DateOperation::DaysUntil, r"\bdays\s*until\s*(\d{4}-\d{2}-\d{2})"),
            (DateOperation::DaysSince, r"\bdays\s*since\s*(\d{4}-\d{2}-\d{2})"),
            (DateOperation::WeeksAhead, r"\bin\s*(\d+)\s*weeks?\b"),
            (DateOperation::MonthsAhead, r"\bin\s*(\d+)\s*months?\b"),
        ]
        .into_iter()
        .map(|(op, pattern)| {
            (op, Regex::new(pattern).expect("date pattern is valid"))
        })
        .collect()
    });

#[derive(Deserialize, JsonSchema)]
pub struct CurrentTimeParameters {
    #[schemars(
        description = "`UTC` (default), `local`, or a UTC offset such as `+03:00`."
    )]
    timezone: Option<String>,
}

/// A tool that reports the current date, weekday and time.
pub struct CurrentTimeTool {
    parameter_schema: Value,
}

impl CurrentTimeTool {
    /// Creates a new current time tool.
    #[inline]
    pub fn new() -> Self {
        CurrentTimeTool {
            parameter_schema: schema_for!(CurrentTimeParameters).to_value(),
        }
    }
}

impl Default for CurrentTimeTool {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl Tool for CurrentTimeTool {
    type Input = CurrentTimeParameters;

    fn name(&self) -> &str {
        "current_time"
    }

    fn description(&self) -> &str {
        "Returns the current date, weekday and time. Use it whenever the task \
         depends on today's date."
    }

    fn parameter_names(&self) -> &[&str] {
        &["timezone"]
    }

    fn parameter_schema(&self) -> &Value {
        &self.parameter_schema
    }

    fn execute(
        &self,
        input: CurrentTimeParameters,
    ) -> impl Future<Output = ToolResult> + Send + 'static {
        let result = parse_zone(input.timezone.as_deref()).map(|zone| match zone {
            Zone::Utc => describe_time(Utc::now(), "UTC"),
            Zone::Local => describe_time(Local::now(), "local time"),
            Zone::Fixed(offset) => {
                describe_time(Utc::now().with_timezone(&offset), &format!("UTC{offset}"))
            }
        });
        ready(result)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Zone {
    Utc,
    Local,
    Fixed(FixedOffset),
}

fn parse_zone(timezone: Option<&str>) -> Result<Zone, ToolError> {
    let timezone = timezone.unwrap_or_default().trim().to_lowercase();
    match timezone.as_str() {
        "" | "utc" | "gmt" | "z" => return Ok(Zone::Utc),
        "local" => return Ok(Zone::Local),
        _ => {}
    }

    let unsupported = || {
        ToolError::invalid_input().with_reason(format!(
            "unsupported timezone `{timezone}`, use UTC, local or an offset like +03:00"
        ))
    };
    let caps = UTC_OFFSET.captures(&timezone).ok_or_else(unsupported)?;
    let hours: i32 = caps[2].parse().map_err(|_| unsupported())?;
    let minutes: i32 = caps
        .get(3)
        .map_or(Ok(0), |m| m.as_str().parse())
        .map_err(|_| unsupported())?;
    if hours > 14 || minutes >= 60 {
        return Err(unsupported());
    }
    let seconds = (hours * 3600 + minutes * 60) * if &caps[1] == "-" { -1 } else { 1 };
    FixedOffset::east_opt(seconds)
        .map(Zone::Fixed)
        .ok_or_else(unsupported)
}

fn describe_time<Tz>(now: DateTime<Tz>, label: &str) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    format!("{} ({label})", now.format("%A, %-d %B %Y, %H:%M"))
}

#[derive(Deserialize, JsonSchema)]
pub struct DateCalculatorParameters {
    #[schemars(
        description = "Date operation, e.g. `in 7 days`, `30 days ago`, `days until 2026-12-31`."
    )]
    operation: String,
}

/// A tool that computes dates relative to today.
pub struct DateCalculatorTool {
    parameter_schema: Value,
}

impl DateCalculatorTool {
    /// Creates a new date calculator tool.
    #[inline]
    pub fn new() -> Self {
        DateCalculatorTool {
            parameter_schema: schema_for!(DateCalculatorParameters).to_value(),
        }
    }
}

impl Default for DateCalculatorTool {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl Tool for DateCalculatorTool {
    type Input = DateCalculatorParameters;

    fn name(&self) -> &str {
        "date_calculator"
    }

    fn description(&self) -> &str {
        "Calculates dates: N days/weeks/months from today, N days ago, days \
         until or since a YYYY-MM-DD date."
    }

    fn parameter_names(&self) -> &[&str] {
        &["operation"]
    }

    fn parameter_schema(&self) -> &Value {
        &self.parameter_schema
    }

    fn execute(
        &self,
        input: DateCalculatorParameters,
    ) -> impl Future<Output = ToolResult> + Send + 'static {
        let today = Local::now().date_naive();
        ready(calculate_date(&input.operation, today))
    }
}

fn calculate_date(operation: &str, today: NaiveDate) -> ToolResult {
    let operation = operation.trim().to_lowercase();
    let Some((op, arg)) = DATE_OPERATIONS.iter().find_map(|(op, regex)| {
        regex
            .captures(&operation)
            .map(|caps| (*op, caps[1].to_owned()))
    }) else {
        return Err(ToolError::invalid_input().with_reason(DATE_OPERATION_HELP));
    };

    match op {
        DateOperation::DaysAhead => {
            let date = shift_days(today, count(&arg)?, true)?;
            Ok(format_date(date))
        }
        DateOperation::DaysAgo => {
            let date = shift_days(today, count(&arg)?, false)?;
            Ok(format_date(date))
        }
        DateOperation::WeeksAhead => {
            let days = count(&arg)?.checked_mul(7).ok_or_else(out_of_range)?;
            Ok(format_date(shift_days(today, days, true)?))
        }
        DateOperation::MonthsAhead => {
            // Months are approximated as 30 days.
            let days = count(&arg)?.checked_mul(30).ok_or_else(out_of_range)?;
            let date = shift_days(today, days, true)?;
            Ok(format!("About {}", date.format("%-d %B %Y")))
        }
        DateOperation::DaysUntil => {
            let target = parse_date(&arg)?;
            let diff = (target - today).num_days();
            if diff < 0 {
                Ok(format!("The date has already passed ({} days ago)", -diff))
            } else {
                Ok(format!("{diff} days until {target}"))
            }
        }
        DateOperation::DaysSince => {
            let target = parse_date(&arg)?;
            let diff = (today - target).num_days();
            if diff < 0 {
                Ok(format!("The date has not come yet (in {} days)", -diff))
            } else {
                Ok(format!("{diff} days since {target}"))
            }
        }
    }
}

fn count(arg: &str) -> Result<u64, ToolError> {
    arg.parse().map_err(|_| out_of_range())
}

fn shift_days(
    today: NaiveDate,
    days: u64,
    forward: bool,
) -> Result<NaiveDate, ToolError> {
    let days = Days::new(days);
    let date = if forward {
        today.checked_add_days(days)
    } else {
        today.checked_sub_days(days)
    };
    date.ok_or_else(out_of_range)
}

fn parse_date(arg: &str) -> Result<NaiveDate, ToolError> {
    NaiveDate::parse_from_str(arg, "%Y-%m-%d").map_err(|_| {
        ToolError::invalid_input().with_reason(format!("invalid date `{arg}`"))
    })
}

#[inline]
fn out_of_range() -> ToolError {
    ToolError::invalid_input().with_reason("date is out of range")
}

#[inline]
fn format_date(date: NaiveDate) -> String {
    date.format("%-d %B %Y (%A)").to_string()
}
