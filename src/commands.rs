//! User intents, one per store operation.

use crate::errors::StoreError;
use crate::models::{MealId, MealInput, ProfileInput, UserId, WorkoutId, WorkoutInput};
use crate::storage::Persistence;
use crate::store::Store;
use serde::{Deserialize, Serialize};

/// An intent emitted by the presentation layer. Tracking intents apply to
/// the currently selected user.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "intent", rename_all = "snake_case")]
pub enum Command {
    CreateProfile(ProfileInput),
    SelectUser { id: UserId },
    AddMeal(MealInput),
    DeleteMeal { id: MealId },
    AddWorkout(WorkoutInput),
    DeleteWorkout { id: WorkoutId },
    SetWater { index: i64 },
    ResetWater,
    ClearAll,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum Outcome {
    Created { id: String },
    Water { count: u8 },
    Done,
}

impl Command {
    pub fn dispatch<P: Persistence>(self, store: &mut Store<P>) -> Result<Outcome, StoreError> {
        match self {
            Command::CreateProfile(input) => {
                let id = store.create_profile(input)?;
                Ok(Outcome::Created { id })
            }
            Command::SelectUser { id } => {
                store.select_user(&id)?;
                Ok(Outcome::Done)
            }
            Command::ClearAll => {
                store.clear_all();
                Ok(Outcome::Done)
            }
            Command::AddMeal(input) => {
                let user = store.require_current()?;
                let id = store.add_meal(&user, input)?;
                Ok(Outcome::Created { id })
            }
            Command::DeleteMeal { id } => {
                let user = store.require_current()?;
                store.delete_meal(&user, &id)?;
                Ok(Outcome::Done)
            }
            Command::AddWorkout(input) => {
                let user = store.require_current()?;
                let id = store.add_workout(&user, input)?;
                Ok(Outcome::Created { id })
            }
            Command::DeleteWorkout { id } => {
                let user = store.require_current()?;
                store.delete_workout(&user, &id)?;
                Ok(Outcome::Done)
            }
            Command::SetWater { index } => {
                let user = store.require_current()?;
                let count = store.set_water(&user, index)?;
                Ok(Outcome::Water { count })
            }
            Command::ResetWater => {
                let user = store.require_current()?;
                store.reset_water(&user)?;
                Ok(Outcome::Water { count: 0 })
            }
        }
    }
}
