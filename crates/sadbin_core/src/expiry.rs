//! Paste lifetimes: the duration catalog, request resolution, and mapping a
//! stored paste's remaining lifetime back onto the catalog for display.

use crate::constants::NEVER_EXPIRE;
use crate::store::KeyTtl;
use crate::validation::ValidationErrors;
use serde::Serialize;

const MINUTE: u64 = 60;
const HOUR: u64 = 60 * MINUTE;
const DAY: u64 = 24 * HOUR;
const YEAR: u64 = 365 * DAY;

/// Selectable finite durations in seconds, ascending.
pub const DURATION_CATALOG: [u64; 15] = [
    5 * MINUTE,
    15 * MINUTE,
    30 * MINUTE,
    HOUR,
    2 * HOUR,
    4 * HOUR,
    6 * HOUR,
    12 * HOUR,
    24 * HOUR,
    48 * HOUR,
    7 * DAY,
    14 * DAY,
    30 * DAY,
    90 * DAY,
    365 * DAY,
];

/// A lifetime: finite seconds or never expiring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Ttl {
    Never,
    Seconds(u64),
}

impl Ttl {
    /// Interpret a selection value where `-1` means never.
    pub fn from_selection(seconds: i64) -> Option<Self> {
        match seconds {
            NEVER_EXPIRE => Some(Self::Never),
            s if s > 0 => Some(Self::Seconds(s.unsigned_abs())),
            _ => None,
        }
    }

    /// The selection value for this lifetime (`-1` for never).
    pub fn as_selection(self) -> i64 {
        match self {
            Self::Never => NEVER_EXPIRE,
            Self::Seconds(s) => i64::try_from(s).unwrap_or(i64::MAX),
        }
    }

    /// Lifetime of a stored key; `None` when the key is gone.
    pub fn from_key_ttl(ttl: KeyTtl) -> Option<Self> {
        match ttl {
            KeyTtl::Missing => None,
            KeyTtl::Persistent => Some(Self::Never),
            KeyTtl::Expires(s) => Some(Self::Seconds(s)),
        }
    }
}

/// One entry of the duration selector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DurationChoice {
    /// Seconds, or `-1` for never.
    pub seconds: i64,
    pub label: String,
    /// Synthetic entry added for a single render.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub temporary: bool,
}

/// Result of mapping a remaining lifetime onto the duration catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DurationReconciliation {
    pub choices: Vec<DurationChoice>,
    pub selected: i64,
    pub temporary_choice_appended: bool,
}

/// Phrase a number of seconds as "N unit(s)", rounded to the largest unit
/// that fits.
pub fn human_duration(seconds: u64) -> String {
    const UNITS: [(u64, &str); 5] = [
        (YEAR, "year"),
        (DAY, "day"),
        (HOUR, "hour"),
        (MINUTE, "minute"),
        (1, "second"),
    ];
    let (unit, name) = UNITS
        .iter()
        .copied()
        .find(|(unit, _)| seconds >= *unit)
        .unwrap_or((1, "second"));
    let count = (seconds + unit / 2) / unit;
    if count == 1 {
        format!("1 {}", name)
    } else {
        format!("{} {}s", count, name)
    }
}

fn label_for(ttl: Ttl) -> String {
    match ttl {
        Ttl::Never => "Never".to_string(),
        Ttl::Seconds(seconds) => human_duration(seconds),
    }
}

/// Build the selector entries: every finite duration ascending, then never.
pub fn list_durations() -> Vec<DurationChoice> {
    DURATION_CATALOG
        .iter()
        .map(|&seconds| Ttl::Seconds(seconds))
        .chain(std::iter::once(Ttl::Never))
        .map(|ttl| DurationChoice {
            seconds: ttl.as_selection(),
            label: label_for(ttl),
            temporary: false,
        })
        .collect()
}

/// Map a remaining lifetime onto `choices`.
///
/// Finite lifetimes select the smallest finite choice that is at least the
/// remaining time. When no such choice exists (or the paste never expires and
/// `choices` has no never entry) a temporary entry with the exact lifetime is
/// appended to the returned copy. `choices` itself is never modified.
pub fn reconcile_for_display(remaining: Ttl, choices: &[DurationChoice]) -> DurationReconciliation {
    let mut result = choices.to_vec();
    let preselect = match remaining {
        Ttl::Never => choices
            .iter()
            .find(|choice| choice.seconds == NEVER_EXPIRE)
            .map(|choice| choice.seconds),
        Ttl::Seconds(secs) => choices
            .iter()
            .filter(|choice| choice.seconds > 0 && choice.seconds.unsigned_abs() >= secs)
            .map(|choice| choice.seconds)
            .min(),
    };

    match preselect {
        Some(selected) => DurationReconciliation {
            choices: result,
            selected,
            temporary_choice_appended: false,
        },
        None => {
            let selected = remaining.as_selection();
            result.push(DurationChoice {
                seconds: selected,
                label: label_for(remaining),
                temporary: true,
            });
            DurationReconciliation {
                choices: result,
                selected,
                temporary_choice_appended: true,
            }
        }
    }
}

/// Lifetime rules configured for one service instance.
#[derive(Debug, Clone)]
pub struct ExpiryPolicy {
    default_ttl: Ttl,
    choices: Vec<DurationChoice>,
}

impl ExpiryPolicy {
    /// Create a policy whose unspecified submissions get `default_ttl`
    /// seconds (`-1` for never; anything else non-positive means never too).
    pub fn new(default_ttl: i64) -> Self {
        Self {
            default_ttl: Ttl::from_selection(default_ttl).unwrap_or(Ttl::Never),
            choices: list_durations(),
        }
    }

    /// Lifetime given to submissions without a duration.
    pub fn default_ttl(&self) -> Ttl {
        self.default_ttl
    }

    /// The selector entries, computed once at construction.
    pub fn list_durations(&self) -> &[DurationChoice] {
        &self.choices
    }

    /// Turn a submitted duration into a lifetime.
    ///
    /// # Errors
    /// Returns a `duration` field error when the value is not one of the
    /// offered choices.
    pub fn resolve_requested_duration(
        &self,
        selection: Option<i64>,
    ) -> Result<Ttl, ValidationErrors> {
        let Some(seconds) = selection else {
            return Ok(self.default_ttl);
        };
        let offered = self.choices.iter().any(|choice| choice.seconds == seconds);
        match Ttl::from_selection(seconds) {
            Some(ttl) if offered => Ok(ttl),
            _ => Err(ValidationErrors::single(
                "duration",
                format!("{} is not an offered duration", seconds),
            )),
        }
    }

    /// [`reconcile_for_display`] against this policy's catalog.
    pub fn reconcile_for_display(&self, remaining: Ttl) -> DurationReconciliation {
        reconcile_for_display(remaining, &self.choices)
    }
}
