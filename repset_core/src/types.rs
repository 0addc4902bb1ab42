//! Core domain types for Repset.
//!
//! This module defines the read-only inputs of a workout session:
//! - Prescriptions (set-based or duration-based)
//! - Exercises
//! - Workout plans

use serde::{Deserialize, Serialize};

// ============================================================================
// Prescription Types
// ============================================================================

/// How a single exercise is to be performed
///
/// Serialized as an internally tagged union so a plan file states the shape
/// explicitly instead of relying on which fields happen to be present.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Prescription {
    /// Discrete sets of repetitions at a given load
    SetBased {
        #[serde(default = "default_set_count")]
        set_count: u32,
        /// Display string, e.g. "10-12"
        #[serde(default)]
        reps: String,
        #[serde(default)]
        load_kg: f64,
        #[serde(default = "default_rest_seconds")]
        rest_seconds: u32,
        #[serde(default)]
        notes: Option<String>,
    },
    /// A single timed effort
    DurationBased {
        #[serde(default)]
        duration_minutes: f64,
        #[serde(default = "default_rest_seconds")]
        rest_seconds: u32,
        #[serde(default)]
        notes: Option<String>,
    },
}

fn default_set_count() -> u32 {
    3
}

fn default_rest_seconds() -> u32 {
    60
}

impl Prescription {
    /// Rest inserted after each completed unit of this exercise
    pub fn rest_seconds(&self) -> u32 {
        match self {
            Prescription::SetBased { rest_seconds, .. }
            | Prescription::DurationBased { rest_seconds, .. } => *rest_seconds,
        }
    }

    pub fn notes(&self) -> Option<&str> {
        match self {
            Prescription::SetBased { notes, .. } | Prescription::DurationBased { notes, .. } => {
                notes.as_deref()
            }
        }
    }

    pub fn is_set_based(&self) -> bool {
        matches!(self, Prescription::SetBased { .. })
    }

    /// One-line human description, e.g. "3 x 8-10 @ 60 kg" or "5 min"
    pub fn summary(&self) -> String {
        match self {
            Prescription::SetBased {
                set_count,
                reps,
                load_kg,
                ..
            } => {
                let reps = if reps.is_empty() { "?" } else { reps.as_str() };
                let mut s = format!("{} x {}", set_count, reps);
                if *load_kg > 0.0 {
                    s.push_str(&format!(" @ {} kg", load_kg));
                }
                s
            }
            Prescription::DurationBased {
                duration_minutes, ..
            } => format!("{} min", duration_minutes),
        }
    }
}

// ============================================================================
// Exercise and Plan Types
// ============================================================================

/// A single exercise within a plan
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Exercise {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub instructions: String,
    pub prescription: Prescription,
}

/// An ordered, immutable list of exercises making up one session
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct WorkoutPlan {
    pub id: String,
    pub name: String,
    pub exercises: Vec<Exercise>,
}

impl WorkoutPlan {
    /// Validate the plan, returning a list of human-readable problems
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.id.trim().is_empty() {
            errors.push("Plan id is empty".to_string());
        }

        if self.exercises.is_empty() {
            errors.push(format!("Plan '{}' has no exercises", self.id));
        }

        let mut seen = std::collections::HashSet::new();
        for exercise in &self.exercises {
            if !seen.insert(exercise.id.as_str()) {
                errors.push(format!("Duplicate exercise id '{}'", exercise.id));
            }

            match &exercise.prescription {
                Prescription::SetBased {
                    set_count, load_kg, ..
                } => {
                    if *set_count < 1 {
                        errors.push(format!(
                            "Exercise '{}' has set_count 0 (must be >= 1)",
                            exercise.id
                        ));
                    }
                    if !load_kg.is_finite() || *load_kg < 0.0 {
                        errors.push(format!(
                            "Exercise '{}' has invalid load_kg {}",
                            exercise.id, load_kg
                        ));
                    }
                }
                Prescription::DurationBased {
                    duration_minutes, ..
                } => {
                    if !duration_minutes.is_finite() || *duration_minutes < 0.0 {
                        errors.push(format!(
                            "Exercise '{}' has invalid duration_minutes {}",
                            exercise.id, duration_minutes
                        ));
                    }
                }
            }
        }

        errors
    }
}
