//! Plan sources.
//!
//! A plan is fetched once before a session starts and never mutated
//! afterwards. Plans come either from the built-in set or from
//! `<plans_dir>/<plan_id>.json`.

use crate::{Error, Exercise, Prescription, Result, WorkoutPlan};
use once_cell::sync::Lazy;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Something that can produce a workout plan by id
pub trait PlanSource {
    fn fetch_plan(&self, plan_id: &str) -> Result<WorkoutPlan>;

    /// Ids of every plan this source can produce, sorted
    fn list_plans(&self) -> Result<Vec<String>>;
}

/// Cached built-in plans - built once and reused
static BUILTIN_PLANS: Lazy<BuiltinPlans> = Lazy::new(BuiltinPlans::build);

/// Get a reference to the cached built-in plans
pub fn get_builtin_plans() -> &'static BuiltinPlans {
    &BUILTIN_PLANS
}

/// Plans shipped with the binary
#[derive(Clone, Debug)]
pub struct BuiltinPlans {
    plans: BTreeMap<String, WorkoutPlan>,
}

impl BuiltinPlans {
    fn build() -> Self {
        let mut plans = BTreeMap::new();

        plans.insert(
            "sample".to_string(),
            WorkoutPlan {
                id: "sample".into(),
                name: "Full Body Starter".into(),
                exercises: vec![
                    Exercise {
                        id: "goblet_squat".into(),
                        name: "Goblet Squat".into(),
                        instructions: "Hold the weight at chest height, sit between the heels, drive up through the midfoot.".into(),
                        prescription: Prescription::SetBased {
                            set_count: 3,
                            reps: "8-10".into(),
                            load_kg: 16.0,
                            rest_seconds: 90,
                            notes: None,
                        },
                    },
                    Exercise {
                        id: "push_up".into(),
                        name: "Push-up".into(),
                        instructions: "Hands under shoulders, body in one line, chest to the floor.".into(),
                        prescription: Prescription::SetBased {
                            set_count: 3,
                            reps: "10-12".into(),
                            load_kg: 0.0,
                            rest_seconds: 60,
                            notes: Some("Elevate the hands if form breaks down".into()),
                        },
                    },
                    Exercise {
                        id: "plank".into(),
                        name: "Front Plank".into(),
                        instructions: "Forearms on the floor, squeeze glutes, keep the hips level.".into(),
                        prescription: Prescription::DurationBased {
                            duration_minutes: 1.0,
                            rest_seconds: 30,
                            notes: None,
                        },
                    },
                ],
            },
        );

        plans.insert(
            "quick".to_string(),
            WorkoutPlan {
                id: "quick".into(),
                name: "Quick Pull".into(),
                exercises: vec![Exercise {
                    id: "inverted_row".into(),
                    name: "Inverted Row".into(),
                    instructions: "Pull the chest to the bar, pause, lower under control.".into(),
                    prescription: Prescription::SetBased {
                        set_count: 2,
                        reps: "8".into(),
                        load_kg: 0.0,
                        rest_seconds: 45,
                        notes: None,
                    },
                }],
            },
        );

        Self { plans }
    }

    pub fn get(&self, plan_id: &str) -> Option<&WorkoutPlan> {
        self.plans.get(plan_id)
    }
}

impl PlanSource for BuiltinPlans {
    fn fetch_plan(&self, plan_id: &str) -> Result<WorkoutPlan> {
        self.get(plan_id)
            .cloned()
            .ok_or_else(|| Error::PlanNotFound(plan_id.to_string()))
    }

    fn list_plans(&self) -> Result<Vec<String>> {
        Ok(self.plans.keys().cloned().collect())
    }
}

/// Loads `<dir>/<plan_id>.json`, falling back to the built-in plans
#[derive(Clone, Debug)]
pub struct DirectoryPlanSource {
    dir: PathBuf,
}

impl DirectoryPlanSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn plan_path(&self, plan_id: &str) -> PathBuf {
        self.dir.join(format!("{}.json", plan_id))
    }

    fn read_plan(path: &Path) -> Result<WorkoutPlan> {
        let contents = std::fs::read_to_string(path)?;
        let plan: WorkoutPlan = serde_json::from_str(&contents)?;
        tracing::debug!("Read plan '{}' from {:?}", plan.id, path);
        Ok(plan)
    }
}

impl PlanSource for DirectoryPlanSource {
    fn fetch_plan(&self, plan_id: &str) -> Result<WorkoutPlan> {
        // Plan ids double as file names
        if plan_id.is_empty() || plan_id.contains(['/', '\\']) || plan_id.starts_with('.') {
            return Err(Error::PlanNotFound(plan_id.to_string()));
        }

        let path = self.plan_path(plan_id);
        let plan = if path.exists() {
            Self::read_plan(&path)?
        } else {
            get_builtin_plans().fetch_plan(plan_id)?
        };

        let errors = plan.validate();
        if !errors.is_empty() {
            return Err(Error::PlanValidation(errors.join("; ")));
        }

        Ok(plan)
    }

    fn list_plans(&self) -> Result<Vec<String>> {
        let mut ids = get_builtin_plans().list_plans()?;

        if self.dir.is_dir() {
            for entry in std::fs::read_dir(&self.dir)? {
                let path = entry?.path();
                if path.extension().and_then(|e| e.to_str()) != Some("json") {
                    continue;
                }
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    ids.push(stem.to_string());
                }
            }
        }

        ids.sort();
        ids.dedup();
        Ok(ids)
    }
}
