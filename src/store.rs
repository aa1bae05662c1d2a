use crate::errors::StoreError;
use crate::models::{
    parse_decimal, parse_int_or_zero, AppData, Bmi, Meal, MealDay, MealId, MealInput,
    ProfileInput, UserId, UserProfile, WaterStatus, Workout, WorkoutDay, WorkoutId, WorkoutInput,
    WATER_GLASSES,
};
use crate::stats;
use crate::storage::Persistence;
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::HashSet;
use tracing::{error, info, warn};

/// In-memory profile store mirrored to a [`Persistence`] backend.
///
/// Memory is authoritative: every mutation is applied first and then saved.
/// A failed save is logged and remembered in [`Store::last_persist_error`];
/// the operation itself still succeeds.
#[derive(Debug)]
pub struct Store<P: Persistence> {
    data: AppData,
    storage: P,
    last_persist_error: Option<String>,
}

impl<P: Persistence> Store<P> {
    /// Loads the snapshot from `storage`, starting empty if there is none.
    pub fn open(storage: P) -> Self {
        let mut data = storage.load().unwrap_or_default();
        normalize(&mut data);
        info!(users = data.users.len(), "profile store loaded");
        Self {
            data,
            storage,
            last_persist_error: None,
        }
    }

    pub fn data(&self) -> &AppData {
        &self.data
    }

    pub fn storage(&self) -> &P {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut P {
        &mut self.storage
    }

    pub fn current_user(&self) -> Option<&UserId> {
        self.data.current_user.as_ref()
    }

    pub fn user(&self, id: &str) -> Result<&UserProfile, StoreError> {
        self.data
            .users
            .get(id)
            .ok_or_else(|| StoreError::user_not_found(id))
    }

    /// Id of the selected user, for the operations that act on it.
    pub fn require_current(&self) -> Result<UserId, StoreError> {
        self.data.current_user.clone().ok_or(StoreError::NoCurrentUser)
    }

    pub fn last_persist_error(&self) -> Option<&str> {
        self.last_persist_error.as_deref()
    }

    pub fn create_profile(&mut self, input: ProfileInput) -> Result<UserId, StoreError> {
        self.create_profile_at(input, Utc::now())
    }

    pub fn create_profile_at(
        &mut self,
        input: ProfileInput,
        at: DateTime<Utc>,
    ) -> Result<UserId, StoreError> {
        let name = input.name.trim().to_string();
        let mut missing = Vec::new();
        if name.is_empty() {
            missing.push("name");
        }
        for (field, value) in [
            ("age", &input.age),
            ("height", &input.height),
            ("weight", &input.weight),
        ] {
            if !value.as_ref().is_some_and(|v| v.is_present()) {
                missing.push(field);
            }
        }
        if !missing.is_empty() {
            return Err(StoreError::validation(format!(
                "required fields missing: {}",
                missing.join(", ")
            )));
        }

        let taken: HashSet<&str> = self.data.users.keys().map(String::as_str).collect();
        let id = timestamp_id(at, &taken);

        let profile = UserProfile {
            id: id.clone(),
            name,
            age: parse_int_or_zero(input.age.as_ref()),
            gender: input.gender,
            height: parse_decimal(input.height.as_ref()).unwrap_or(0.0),
            weight: parse_decimal(input.weight.as_ref()).unwrap_or(0.0),
            target_weight: parse_decimal(input.target_weight.as_ref()),
            fitness_goal: input.fitness_goal,
            activity_level: input.activity_level,
            created_at: at,
            water: 0,
            meals: Vec::new(),
            workouts: Vec::new(),
        };

        info!(user_id = %id, name = %profile.name, "profile created");
        self.data.users.insert(id.clone(), profile);
        self.persist();
        Ok(id)
    }

    pub fn select_user(&mut self, id: &str) -> Result<(), StoreError> {
        if !self.data.users.contains_key(id) {
            return Err(StoreError::user_not_found(id));
        }
        self.data.current_user = Some(id.to_string());
        info!(user_id = %id, "user selected");
        self.persist();
        Ok(())
    }

    pub fn clear_all(&mut self) {
        self.data = AppData::default();
        info!("all profiles cleared");
        self.persist();
    }

    /// Water-glass click. Clicking the first empty glass fills one more,
    /// clicking the last filled glass empties it, any other glass fills up
    /// to and including that glass.
    pub fn set_water(&mut self, user_id: &str, index: i64) -> Result<u8, StoreError> {
        let user = self.user_mut(user_id)?;
        let current = i64::from(user.water);
        let next = if index == current {
            current + 1
        } else if index == current - 1 {
            current - 1
        } else {
            index.saturating_add(1)
        };
        user.water = next.clamp(0, i64::from(WATER_GLASSES)) as u8;
        let water = user.water;
        self.persist();
        Ok(water)
    }

    pub fn reset_water(&mut self, user_id: &str) -> Result<(), StoreError> {
        self.user_mut(user_id)?.water = 0;
        self.persist();
        Ok(())
    }

    pub fn add_meal(&mut self, user_id: &str, input: MealInput) -> Result<MealId, StoreError> {
        self.add_meal_at(user_id, input, Utc::now())
    }

    pub fn add_meal_at(
        &mut self,
        user_id: &str,
        input: MealInput,
        at: DateTime<Utc>,
    ) -> Result<MealId, StoreError> {
        let name = input.name.trim().to_string();
        if name.is_empty() {
            return Err(StoreError::validation("meal name is required"));
        }

        let user = self.user_mut(user_id)?;
        let taken: HashSet<&str> = user.meals.iter().map(|m| m.id.as_str()).collect();
        let id = timestamp_id(at, &taken);
        user.meals.push(Meal {
            id: id.clone(),
            meal_type: input.meal_type,
            name,
            calories: parse_int_or_zero(input.calories.as_ref()),
            protein: parse_int_or_zero(input.protein.as_ref()),
            date: at,
        });

        info!(user_id = %user_id, meal_id = %id, meal_type = %input.meal_type, "meal logged");
        self.persist();
        Ok(id)
    }

    /// Removes a meal; an unknown id leaves everything as it was.
    pub fn delete_meal(&mut self, user_id: &str, meal_id: &str) -> Result<(), StoreError> {
        let user = self.user_mut(user_id)?;
        let before = user.meals.len();
        user.meals.retain(|meal| meal.id != meal_id);
        if user.meals.len() == before {
            warn!(user_id = %user_id, meal_id = %meal_id, "meal to delete not found");
        }
        self.persist();
        Ok(())
    }

    pub fn add_workout(
        &mut self,
        user_id: &str,
        input: WorkoutInput,
    ) -> Result<WorkoutId, StoreError> {
        self.add_workout_at(user_id, input, Utc::now())
    }

    pub fn add_workout_at(
        &mut self,
        user_id: &str,
        input: WorkoutInput,
        at: DateTime<Utc>,
    ) -> Result<WorkoutId, StoreError> {
        let name = input.name.trim().to_string();
        if name.is_empty() {
            return Err(StoreError::validation("exercise name is required"));
        }

        let user = self.user_mut(user_id)?;
        let taken: HashSet<&str> = user.workouts.iter().map(|w| w.id.as_str()).collect();
        let id = timestamp_id(at, &taken);
        user.workouts.push(Workout {
            id: id.clone(),
            name,
            workout_type: input.workout_type,
            duration: parse_int_or_zero(input.duration.as_ref()),
            calories: parse_int_or_zero(input.calories.as_ref()),
            sets: input.sets.as_ref().and_then(|v| v.to_text()),
            reps: input.reps.as_ref().and_then(|v| v.to_text()),
            notes: input
                .notes
                .map(|notes| notes.trim().to_string())
                .filter(|notes| !notes.is_empty()),
            date: at,
        });

        info!(user_id = %user_id, workout_id = %id, workout_type = %input.workout_type, "workout logged");
        self.persist();
        Ok(id)
    }

    /// Removes a workout; an unknown id leaves everything as it was.
    pub fn delete_workout(&mut self, user_id: &str, workout_id: &str) -> Result<(), StoreError> {
        let user = self.user_mut(user_id)?;
        let before = user.workouts.len();
        user.workouts.retain(|workout| workout.id != workout_id);
        if user.workouts.len() == before {
            warn!(user_id = %user_id, workout_id = %workout_id, "workout to delete not found");
        }
        self.persist();
        Ok(())
    }

    pub fn bmi(&self, user_id: &str) -> Result<Option<Bmi>, StoreError> {
        Ok(stats::compute_bmi(self.user(user_id)?))
    }

    pub fn water(&self, user_id: &str) -> Result<WaterStatus, StoreError> {
        Ok(stats::water_status(self.user(user_id)?.water))
    }

    pub fn daily_meal_totals(&self, user_id: &str, day: NaiveDate) -> Result<MealDay, StoreError> {
        Ok(stats::daily_meal_totals_on(day, self.user(user_id)?))
    }

    pub fn daily_workout_totals(
        &self,
        user_id: &str,
        day: NaiveDate,
    ) -> Result<WorkoutDay, StoreError> {
        Ok(stats::daily_workout_totals_on(day, self.user(user_id)?))
    }

    fn user_mut(&mut self, id: &str) -> Result<&mut UserProfile, StoreError> {
        self.data
            .users
            .get_mut(id)
            .ok_or_else(|| StoreError::user_not_found(id))
    }

    fn persist(&mut self) {
        match self.storage.save(&self.data) {
            Ok(()) => self.last_persist_error = None,
            Err(err) => {
                error!("failed to persist snapshot: {err}");
                self.last_persist_error = Some(err.to_string());
            }
        }
    }
}

/// Repairs a freshly loaded snapshot so the store invariants hold.
fn normalize(data: &mut AppData) {
    if let Some(current) = &data.current_user {
        if !data.users.contains_key(current) {
            warn!(user_id = %current, "dropping selection of unknown user");
            data.current_user = None;
        }
    }
    for user in data.users.values_mut() {
        user.water = user.water.min(WATER_GLASSES);
    }
}

/// Millisecond timestamp as an id, bumped until it is not in `taken`.
fn timestamp_id(at: DateTime<Utc>, taken: &HashSet<&str>) -> String {
    let mut millis = at.timestamp_millis();
    loop {
        let candidate = millis.to_string();
        if !taken.contains(candidate.as_str()) {
            return candidate;
        }
        millis += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FormValue, MealType, WorkoutType, STORAGE_KEY};
    use crate::storage::MemoryStorage;
    use chrono::{Duration, Local, TimeZone};

    fn store() -> Store<MemoryStorage> {
        Store::open(MemoryStorage::new())
    }

    fn profile_input(name: &str) -> ProfileInput {
        ProfileInput {
            name: name.into(),
            age: Some("29".into()),
            gender: "female".into(),
            height: Some("165".into()),
            weight: Some(FormValue::Int(60)),
            target_weight: Some("".into()),
            fitness_goal: "maintain".into(),
            activity_level: "light".into(),
        }
    }

    fn meal_input(name: &str, calories: &str, protein: &str) -> MealInput {
        MealInput {
            meal_type: MealType::Dinner,
            name: name.into(),
            calories: Some(calories.into()),
            protein: Some(protein.into()),
        }
    }

    fn with_user() -> (Store<MemoryStorage>, UserId) {
        let mut store = store();
        let id = store.create_profile(profile_input("Mia")).unwrap();
        store.select_user(&id).unwrap();
        (store, id)
    }

    fn local_noon(day: NaiveDate) -> DateTime<Utc> {
        Local
            .from_local_datetime(&day.and_hms_opt(12, 0, 0).unwrap())
            .earliest()
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn create_profile_initializes_tracking_state() {
        let mut store = store();
        let at = Utc.with_ymd_and_hms(2026, 2, 1, 9, 0, 0).unwrap();
        let id = store.create_profile_at(profile_input("  Mia "), at).unwrap();

        assert_eq!(id, at.timestamp_millis().to_string());
        let user = store.user(&id).unwrap();
        assert_eq!(user.name, "Mia");
        assert_eq!(user.age, 29);
        assert_eq!(user.height, 165.0);
        assert_eq!(user.weight, 60.0);
        assert_eq!(user.target_weight, None);
        assert_eq!(user.water, 0);
        assert!(user.meals.is_empty() && user.workouts.is_empty());
        assert_eq!(store.storage().load().as_ref(), Some(store.data()));
    }

    #[test]
    fn create_profile_rejects_missing_required_fields() {
        let mut store = store();
        let mut input = profile_input("Mia");
        input.height = Some("   ".into());
        input.age = None;

        let err = store.create_profile(input).unwrap_err();
        assert!(matches!(err, StoreError::Validation(ref msg) if msg.contains("age") && msg.contains("height")));
        assert!(store.data().users.is_empty());
    }

    #[test]
    fn profile_ids_stay_unique_within_one_millisecond() {
        let mut store = store();
        let at = Utc::now();
        let first = store.create_profile_at(profile_input("A"), at).unwrap();
        let second = store.create_profile_at(profile_input("B"), at).unwrap();
        assert_ne!(first, second);
        assert_eq!(store.data().users.len(), 2);
    }

    #[test]
    fn select_unknown_user_fails() {
        let mut store = store();
        let err = store.select_user("42").unwrap_err();
        assert!(matches!(err, StoreError::NotFound { kind: "user", .. }));
        assert!(store.current_user().is_none());
    }

    #[test]
    fn clear_all_then_select_fails() {
        let (mut store, id) = with_user();
        store.clear_all();
        assert!(store.data().users.is_empty());
        assert!(store.current_user().is_none());
        assert!(matches!(
            store.select_user(&id),
            Err(StoreError::NotFound { .. })
        ));
        assert_eq!(store.storage().load(), Some(AppData::default()));
    }

    #[test]
    fn water_clicks_follow_three_way_rule() {
        let (mut store, id) = with_user();

        // first empty glass adds one
        assert_eq!(store.set_water(&id, 0).unwrap(), 1);
        assert_eq!(store.set_water(&id, 1).unwrap(), 2);
        // last filled glass removes one
        assert_eq!(store.set_water(&id, 1).unwrap(), 1);
        // anything else fills through that glass
        assert_eq!(store.set_water(&id, 5).unwrap(), 6);
        assert_eq!(store.set_water(&id, 2).unwrap(), 3);
        assert_eq!(store.set_water(&id, 7).unwrap(), 8);
        // clicking past the last glass stays capped
        assert_eq!(store.set_water(&id, 8).unwrap(), 8);
    }

    #[test]
    fn water_stays_in_range_for_any_index() {
        let (mut store, id) = with_user();
        for index in -20..30 {
            for start in 0..=8 {
                store.data.users.get_mut(&id).unwrap().water = start;
                let water = store.set_water(&id, index).unwrap();
                assert!(water <= 8, "index {index} from {start} gave {water}");
                let current = i64::from(start);
                let expected = if index == current {
                    current + 1
                } else if index == current - 1 {
                    current - 1
                } else {
                    index + 1
                };
                assert_eq!(i64::from(water), expected.clamp(0, 8));
            }
        }
        assert_eq!(store.set_water(&id, i64::MAX).unwrap(), 8);
    }

    #[test]
    fn reset_water_empties_glasses() {
        let (mut store, id) = with_user();
        store.set_water(&id, 4).unwrap();
        store.reset_water(&id).unwrap();
        assert_eq!(store.user(&id).unwrap().water, 0);
        assert_eq!(store.water(&id).unwrap().progress_percent, 0);
    }

    #[test]
    fn water_for_unknown_user_fails() {
        let mut store = store();
        assert!(matches!(
            store.set_water("missing", 0),
            Err(StoreError::NotFound { .. })
        ));
    }

    #[test]
    fn add_meal_defaults_unparsable_numbers() {
        let (mut store, id) = with_user();
        let meal_id = store.add_meal(&id, meal_input("Pasta", "lots", "25g")).unwrap();

        let meal = &store.user(&id).unwrap().meals[0];
        assert_eq!(meal.id, meal_id);
        assert_eq!(meal.meal_type, MealType::Dinner);
        assert_eq!(meal.calories, 0);
        assert_eq!(meal.protein, 25);
    }

    #[test]
    fn add_meal_with_empty_name_changes_nothing() {
        let (mut store, id) = with_user();
        store.add_meal(&id, meal_input("Soup", "200", "8")).unwrap();
        let before = store.user(&id).unwrap().meals.clone();

        let err = store.add_meal(&id, meal_input("  ", "500", "30")).unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
        assert_eq!(store.user(&id).unwrap().meals, before);
    }

    #[test]
    fn meals_keep_insertion_order_with_unique_ids() {
        let (mut store, id) = with_user();
        let at = Utc::now();
        let a = store.add_meal_at(&id, meal_input("Eggs", "150", "12"), at).unwrap();
        let b = store.add_meal_at(&id, meal_input("Toast", "90", "3"), at).unwrap();
        assert_ne!(a, b);

        let names: Vec<_> = store.user(&id).unwrap().meals.iter().map(|m| m.name.clone()).collect();
        assert_eq!(names, ["Eggs", "Toast"]);
    }

    #[test]
    fn delete_meal_removes_only_matching_id() {
        let (mut store, id) = with_user();
        let keep = store.add_meal(&id, meal_input("Salad", "120", "4")).unwrap();
        let cake = store.add_meal(&id, meal_input("Cake", "450", "5")).unwrap();

        store.delete_meal(&id, &cake).unwrap();
        let meals = &store.user(&id).unwrap().meals;
        assert_eq!(meals.len(), 1);
        assert_eq!(meals[0].id, keep);
    }

    #[test]
    fn delete_unknown_meal_is_a_no_op() {
        let (mut store, id) = with_user();
        store.add_meal(&id, meal_input("Salad", "120", "4")).unwrap();
        let before = store.user(&id).unwrap().meals.clone();

        store.delete_meal(&id, "does-not-exist").unwrap();
        assert_eq!(store.user(&id).unwrap().meals, before);
    }

    #[test]
    fn add_workout_keeps_optional_fields() {
        let (mut store, id) = with_user();
        let input = WorkoutInput {
            name: " Bench press ".into(),
            workout_type: WorkoutType::Strength,
            duration: Some("45".into()),
            calories: Some("nope".into()),
            sets: Some(FormValue::Int(4)),
            reps: Some("".into()),
            notes: Some("  felt strong ".into()),
        };
        let workout_id = store.add_workout(&id, input).unwrap();

        let workout = &store.user(&id).unwrap().workouts[0];
        assert_eq!(workout.id, workout_id);
        assert_eq!(workout.name, "Bench press");
        assert_eq!(workout.duration, 45);
        assert_eq!(workout.calories, 0);
        assert_eq!(workout.sets.as_deref(), Some("4"));
        assert_eq!(workout.reps, None);
        assert_eq!(workout.notes.as_deref(), Some("felt strong"));
    }

    #[test]
    fn add_workout_requires_name() {
        let (mut store, id) = with_user();
        let err = store.add_workout(&id, WorkoutInput::default()).unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
        assert!(store.user(&id).unwrap().workouts.is_empty());
    }

    #[test]
    fn delete_workout_ignores_unknown_ids() {
        let (mut store, id) = with_user();
        let input = WorkoutInput {
            name: "Yoga".into(),
            workout_type: WorkoutType::Flexibility,
            ..WorkoutInput::default()
        };
        let workout_id = store.add_workout(&id, input).unwrap();

        store.delete_workout(&id, "nope").unwrap();
        assert_eq!(store.user(&id).unwrap().workouts.len(), 1);
        store.delete_workout(&id, &workout_id).unwrap();
        assert!(store.user(&id).unwrap().workouts.is_empty());
    }

    #[test]
    fn daily_meal_totals_exclude_yesterday() {
        let (mut store, id) = with_user();
        let today = Local::now().date_naive();
        let yesterday = today - Duration::days(1);
        store
            .add_meal_at(&id, meal_input("Late pizza", "900", "30"), local_noon(yesterday))
            .unwrap();
        store
            .add_meal_at(&id, meal_input("Porridge", "300", "10"), local_noon(today))
            .unwrap();

        let totals = store.daily_meal_totals(&id, today).unwrap();
        assert_eq!(totals.calories, 300);
        assert_eq!(totals.protein, 10);
        assert_eq!(totals.meals.len(), 1);
    }

    #[test]
    fn save_failure_keeps_memory_state() {
        let (mut store, id) = with_user();
        store.storage_mut().fail_writes(true);

        store.add_meal(&id, meal_input("Apple", "80", "0")).unwrap();
        assert_eq!(store.user(&id).unwrap().meals.len(), 1);
        assert!(store.last_persist_error().is_some());
        assert!(store.storage().load().unwrap().users[&id].meals.is_empty());

        store.storage_mut().fail_writes(false);
        store.reset_water(&id).unwrap();
        assert!(store.last_persist_error().is_none());
        assert_eq!(store.storage().load().as_ref(), Some(store.data()));
    }

    #[test]
    fn reopen_round_trips_through_storage() {
        let (mut store, id) = with_user();
        store.add_meal(&id, meal_input("Rice", "400", "8")).unwrap();
        store.set_water(&id, 3).unwrap();

        let reopened = Store::open(store.storage().clone());
        assert_eq!(reopened.data(), store.data());
        assert_eq!(reopened.current_user(), Some(&id));
    }

    #[test]
    fn oversized_weight_is_stored_as_zero_and_reloads() {
        let mut store = store();
        let mut input = profile_input("Big");
        input.weight = Some("9".repeat(400).as_str().into());
        let id = store.create_profile(input).unwrap();
        assert_eq!(store.user(&id).unwrap().weight, 0.0);
        assert!(store.bmi(&id).unwrap().is_none());

        let reopened = Store::open(store.storage().clone());
        assert_eq!(reopened.data(), store.data());
    }

    #[test]
    fn decimal_fields_reload_bit_for_bit() {
        let mut store = store();
        let mut input = profile_input("Exact");
        input.weight = Some("91.19885887649531".into());
        input.height = Some("172.34567890123457".into());
        input.target_weight = Some("0.30000000000000004".into());
        let id = store.create_profile(input).unwrap();

        let reopened = Store::open(store.storage().clone());
        let user = reopened.user(&id).unwrap();
        assert_eq!(user.weight.to_bits(), 91.19885887649531_f64.to_bits());
        assert_eq!(reopened.data(), store.data());
    }

    #[test]
    fn open_drops_dangling_selection() {
        let mut storage = MemoryStorage::new();
        let snapshot = r#"{"users":{},"currentUser":"123"}"#;
        storage.set_item(STORAGE_KEY, snapshot.into()).unwrap();

        let store = Store::open(storage);
        assert!(store.current_user().is_none());
    }
}
