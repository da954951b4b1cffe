//! Action specification and decoded action buffers.

use smallvec::SmallVec;

/// Describes the action space a model drives.
///
/// A model produces either continuous actions or discrete actions, never
/// both. Discrete actions are split into independent branches; each
/// branch picks exactly one index in `0..branch_size`.
///
/// # Examples
///
/// ```
/// use cadre_core::ActionSpec;
///
/// let spec = ActionSpec::discrete(&[3, 2]);
/// assert_eq!(spec.action_size(), 2);
/// assert_eq!(spec.logit_count(), 5);
///
/// let spec = ActionSpec::continuous(4);
/// assert_eq!(spec.action_size(), 4);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ActionSpec {
    /// `size` real-valued actions per agent.
    Continuous {
        /// Number of continuous values per agent.
        size: usize,
    },
    /// One sampled index per branch.
    Discrete {
        /// Number of choices in each branch, in branch order.
        branches: SmallVec<[usize; 4]>,
    },
}

impl ActionSpec {
    /// A continuous action space of `size` values.
    pub fn continuous(size: usize) -> Self {
        Self::Continuous { size }
    }

    /// A discrete action space with the given branch sizes.
    pub fn discrete(branches: &[usize]) -> Self {
        Self::Discrete {
            branches: SmallVec::from_slice(branches),
        }
    }

    /// Number of values in one decoded action.
    ///
    /// For continuous actions this is the vector length; for discrete
    /// actions it is the number of branches.
    pub fn action_size(&self) -> usize {
        match self {
            Self::Continuous { size } => *size,
            Self::Discrete { branches } => branches.len(),
        }
    }

    /// Number of columns the model emits per agent for the action output.
    ///
    /// Equal to `action_size()` for continuous actions and to the sum of
    /// branch sizes for discrete actions.
    pub fn logit_count(&self) -> usize {
        match self {
            Self::Continuous { size } => *size,
            Self::Discrete { branches } => branches.iter().sum(),
        }
    }

    /// Branch sizes, empty for continuous specs.
    pub fn branch_sizes(&self) -> &[usize] {
        match self {
            Self::Continuous { .. } => &[],
            Self::Discrete { branches } => branches,
        }
    }

    /// Whether this spec describes continuous actions.
    pub fn is_continuous(&self) -> bool {
        matches!(self, Self::Continuous { .. })
    }

    /// Check structural invariants.
    ///
    /// A spec must describe at least one action, and every discrete branch
    /// must offer at least one choice.
    pub fn validate(&self) -> Result<(), String> {
        match self {
            Self::Continuous { size } => {
                if *size == 0 {
                    return Err("continuous action size must be at least 1".into());
                }
            }
            Self::Discrete { branches } => {
                if branches.is_empty() {
                    return Err("discrete action spec has no branches".into());
                }
                if let Some(i) = branches.iter().position(|&b| b == 0) {
                    return Err(format!("discrete branch {i} has size 0"));
                }
            }
        }
        Ok(())
    }
}

/// The most recent decoded action for one agent.
///
/// Exactly one of the two vectors is populated, according to the
/// [`ActionSpec`] of the model that produced it.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ActionBuffer {
    /// Continuous action values.
    pub continuous: Vec<f32>,
    /// Sampled discrete indices, one per branch.
    pub discrete: Vec<i32>,
}

impl ActionBuffer {
    /// An action holding only continuous values.
    pub fn from_continuous(values: Vec<f32>) -> Self {
        Self {
            continuous: values,
            discrete: Vec::new(),
        }
    }

    /// An action holding only discrete branch indices.
    pub fn from_discrete(indices: Vec<i32>) -> Self {
        Self {
            continuous: Vec::new(),
            discrete: indices,
        }
    }

    /// Whether neither vector carries any value.
    pub fn is_empty(&self) -> bool {
        self.continuous.is_empty() && self.discrete.is_empty()
    }
}
