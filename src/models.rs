use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Key under which the whole snapshot lives in the local key-value store.
pub const STORAGE_KEY: &str = "fittrack_data_v1";

/// Number of glasses on the water tracker.
pub const WATER_GLASSES: u8 = 8;

pub type UserId = String;
pub type MealId = String;
pub type WorkoutId = String;

/// Persisted snapshot: every profile plus the currently selected one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct AppData {
    #[serde(default)]
    pub users: BTreeMap<UserId, UserProfile>,
    #[serde(default)]
    pub current_user: Option<UserId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: UserId,
    pub name: String,
    pub age: u32,
    #[serde(default)]
    pub gender: String,
    /// Centimetres.
    pub height: f64,
    /// Kilograms.
    pub weight: f64,
    #[serde(default)]
    pub target_weight: Option<f64>,
    #[serde(default)]
    pub fitness_goal: String,
    #[serde(default)]
    pub activity_level: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub water: u8,
    #[serde(default)]
    pub meals: Vec<Meal>,
    #[serde(default)]
    pub workouts: Vec<Workout>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MealType {
    #[default]
    Breakfast,
    Lunch,
    Dinner,
    Snack,
}

impl fmt::Display for MealType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            MealType::Breakfast => "breakfast",
            MealType::Lunch => "lunch",
            MealType::Dinner => "dinner",
            MealType::Snack => "snack",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meal {
    pub id: MealId,
    #[serde(rename = "type")]
    pub meal_type: MealType,
    pub name: String,
    pub calories: u32,
    pub protein: u32,
    pub date: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum WorkoutType {
    Cardio,
    Strength,
    Flexibility,
    Sports,
    #[default]
    Other,
}

impl fmt::Display for WorkoutType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            WorkoutType::Cardio => "cardio",
            WorkoutType::Strength => "strength",
            WorkoutType::Flexibility => "flexibility",
            WorkoutType::Sports => "sports",
            WorkoutType::Other => "other",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workout {
    pub id: WorkoutId,
    pub name: String,
    #[serde(rename = "type")]
    pub workout_type: WorkoutType,
    /// Minutes.
    pub duration: u32,
    pub calories: u32,
    #[serde(default)]
    pub sets: Option<String>,
    #[serde(default)]
    pub reps: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    pub date: DateTime<Utc>,
}

/// A raw form field. Clients may send numbers either as JSON numbers or as
/// the text typed into an input box.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FormValue {
    Int(i64),
    Float(f64),
    Text(String),
}

impl FormValue {
    /// True unless the field is blank text.
    pub fn is_present(&self) -> bool {
        match self {
            FormValue::Text(text) => !text.trim().is_empty(),
            _ => true,
        }
    }

    /// Trimmed textual form, `None` when blank.
    pub fn to_text(&self) -> Option<String> {
        match self {
            FormValue::Int(value) => Some(value.to_string()),
            FormValue::Float(value) => Some(value.to_string()),
            FormValue::Text(text) => {
                let trimmed = text.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            }
        }
    }
}

impl From<&str> for FormValue {
    fn from(value: &str) -> Self {
        FormValue::Text(value.to_string())
    }
}

/// Parses a non-negative integer the lenient way a form does: leading sign
/// and digits are honoured, trailing garbage is ignored, anything else is 0.
/// Negative values clamp to 0.
pub fn parse_int_or_zero(value: Option<&FormValue>) -> u32 {
    let parsed = match value {
        None => 0,
        Some(FormValue::Int(n)) => *n,
        Some(FormValue::Float(f)) if f.is_finite() => f.trunc() as i64,
        Some(FormValue::Float(_)) => 0,
        Some(FormValue::Text(text)) => leading_int(text).unwrap_or(0),
    };
    parsed.clamp(0, i64::from(u32::MAX)) as u32
}

/// Lenient decimal parse; `None` when no leading number can be read.
pub fn parse_decimal(value: Option<&FormValue>) -> Option<f64> {
    match value? {
        FormValue::Int(n) => Some(*n as f64),
        FormValue::Float(f) if f.is_finite() => Some(*f),
        FormValue::Float(_) => None,
        FormValue::Text(text) => leading_decimal(text),
    }
}

fn leading_int(text: &str) -> Option<i64> {
    let trimmed = text.trim_start();
    let (negative, rest) = split_sign(trimmed);
    let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    let magnitude = digits.parse::<i64>().unwrap_or(i64::MAX);
    Some(if negative { -magnitude } else { magnitude })
}

fn leading_decimal(text: &str) -> Option<f64> {
    let trimmed = text.trim_start();
    let (negative, rest) = split_sign(trimmed);
    let mut end = 0;
    let mut seen_dot = false;
    let mut seen_digit = false;
    for (idx, ch) in rest.char_indices() {
        if ch.is_ascii_digit() {
            seen_digit = true;
        } else if ch == '.' && !seen_dot {
            seen_dot = true;
        } else {
            break;
        }
        end = idx + ch.len_utf8();
    }
    if !seen_digit {
        return None;
    }
    let magnitude: f64 = rest[..end].trim_end_matches('.').parse().ok()?;
    // Digit runs too long for f64 overflow to infinity, which JSON cannot hold.
    let value = if negative { -magnitude } else { magnitude };
    value.is_finite().then_some(value)
}

fn split_sign(text: &str) -> (bool, &str) {
    if let Some(rest) = text.strip_prefix('-') {
        (true, rest)
    } else if let Some(rest) = text.strip_prefix('+') {
        (false, rest)
    } else {
        (false, text)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileInput {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub age: Option<FormValue>,
    #[serde(default)]
    pub gender: String,
    #[serde(default)]
    pub height: Option<FormValue>,
    #[serde(default)]
    pub weight: Option<FormValue>,
    #[serde(default)]
    pub target_weight: Option<FormValue>,
    #[serde(default)]
    pub fitness_goal: String,
    #[serde(default)]
    pub activity_level: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MealInput {
    #[serde(rename = "type", default)]
    pub meal_type: MealType,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub calories: Option<FormValue>,
    #[serde(default)]
    pub protein: Option<FormValue>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkoutInput {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub workout_type: WorkoutType,
    #[serde(default)]
    pub duration: Option<FormValue>,
    #[serde(default)]
    pub calories: Option<FormValue>,
    #[serde(default)]
    pub sets: Option<FormValue>,
    #[serde(default)]
    pub reps: Option<FormValue>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BmiCategory {
    Underweight,
    Normal,
    Overweight,
    Obese,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bmi {
    pub value: f64,
    pub category: BmiCategory,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MealDay {
    pub date: String,
    pub calories: u64,
    pub protein: u64,
    pub meals: Vec<Meal>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutDay {
    pub date: String,
    pub count_today: usize,
    pub calories_today: u64,
    pub total_count: usize,
    pub total_calories: u64,
    pub workouts: Vec<Workout>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WaterStatus {
    pub count: u8,
    pub glasses: u8,
    pub progress_percent: u8,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserCard {
    pub id: UserId,
    pub name: String,
    pub initial: char,
    pub age: u32,
    pub gender: String,
    pub weight: f64,
    pub target_weight: Option<f64>,
    pub workout_count: usize,
    pub meal_count: usize,
    pub water: u8,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardResponse {
    pub current_user: Option<UserId>,
    pub users: Vec<UserCard>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaterRequest {
    pub index: i64,
}
