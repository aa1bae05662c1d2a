use crate::models::{
    AppData, Bmi, BmiCategory, DashboardResponse, MealDay, UserCard, UserProfile, WaterStatus,
    WorkoutDay, WATER_GLASSES,
};
use chrono::{DateTime, Local, NaiveDate, Utc};

/// Body mass index from height (cm) and weight (kg). `None` when either is
/// zero or not a number.
pub fn compute_bmi(profile: &UserProfile) -> Option<Bmi> {
    bmi_from(profile.height, profile.weight)
}

pub fn bmi_from(height_cm: f64, weight_kg: f64) -> Option<Bmi> {
    if !height_cm.is_finite() || !weight_kg.is_finite() || height_cm <= 0.0 || weight_kg <= 0.0 {
        return None;
    }

    let height_m = height_cm / 100.0;
    let bmi = weight_kg / (height_m * height_m);
    // Category comes from the unrounded value.
    let category = if bmi < 18.5 {
        BmiCategory::Underweight
    } else if bmi < 25.0 {
        BmiCategory::Normal
    } else if bmi < 30.0 {
        BmiCategory::Overweight
    } else {
        BmiCategory::Obese
    };

    Some(Bmi {
        value: (bmi * 10.0).round() / 10.0,
        category,
    })
}

pub fn daily_meal_totals_on(day: NaiveDate, profile: &UserProfile) -> MealDay {
    let meals: Vec<_> = profile
        .meals
        .iter()
        .filter(|meal| is_on_day(&meal.date, day))
        .cloned()
        .collect();

    let calories = meals.iter().map(|meal| u64::from(meal.calories)).sum();
    let protein = meals.iter().map(|meal| u64::from(meal.protein)).sum();

    MealDay {
        date: day.to_string(),
        calories,
        protein,
        meals,
    }
}

pub fn daily_workout_totals_on(day: NaiveDate, profile: &UserProfile) -> WorkoutDay {
    let workouts: Vec<_> = profile
        .workouts
        .iter()
        .filter(|workout| is_on_day(&workout.date, day))
        .cloned()
        .collect();

    WorkoutDay {
        date: day.to_string(),
        count_today: workouts.len(),
        calories_today: workouts.iter().map(|w| u64::from(w.calories)).sum(),
        total_count: profile.workouts.len(),
        total_calories: profile.workouts.iter().map(|w| u64::from(w.calories)).sum(),
        workouts,
    }
}

pub fn water_status(water: u8) -> WaterStatus {
    let count = water.min(WATER_GLASSES);
    let progress = (f64::from(count) / f64::from(WATER_GLASSES) * 100.0).round();
    WaterStatus {
        count,
        glasses: WATER_GLASSES,
        progress_percent: progress as u8,
    }
}

pub fn user_card(profile: &UserProfile) -> UserCard {
    let initial = profile
        .name
        .chars()
        .next()
        .and_then(|c| c.to_uppercase().next())
        .unwrap_or('U');

    UserCard {
        id: profile.id.clone(),
        name: profile.name.clone(),
        initial,
        age: profile.age,
        gender: profile.gender.clone(),
        weight: profile.weight,
        target_weight: profile.target_weight,
        workout_count: profile.workouts.len(),
        meal_count: profile.meals.len(),
        water: profile.water,
    }
}

pub fn build_dashboard(data: &AppData) -> DashboardResponse {
    DashboardResponse {
        current_user: data.current_user.clone(),
        users: data.users.values().map(user_card).collect(),
    }
}

/// Local-time calendar day check.
fn is_on_day(timestamp: &DateTime<Utc>, day: NaiveDate) -> bool {
    timestamp.with_timezone(&Local).date_naive() == day
}
