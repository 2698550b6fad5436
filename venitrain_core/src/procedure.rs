//! Static venipuncture procedure: five ordered steps with advisory sub-items.

use std::fmt;

use serde::Serialize;

use crate::error::TrainerError;

/// Number of steps in the procedure.
pub const STEP_COUNT: u8 = 5;

/// Validated step id in `1..=STEP_COUNT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct StepId(u8);

impl StepId {
    pub const FIRST: StepId = StepId(1);
    pub const LAST: StepId = StepId(STEP_COUNT);

    pub fn new(id: u8) -> Result<Self, TrainerError> {
        if (1..=STEP_COUNT).contains(&id) {
            Ok(Self(id))
        } else {
            Err(TrainerError::StepOutOfRange {
                id,
                max: STEP_COUNT,
            })
        }
    }

    pub fn get(self) -> u8 {
        self.0
    }

    /// Following step, or `None` for the last one.
    pub fn next(self) -> Option<StepId> {
        (self.0 < STEP_COUNT).then(|| StepId(self.0 + 1))
    }

    /// Preceding step, clamped to the first.
    pub fn prev_clamped(self) -> StepId {
        StepId(self.0.saturating_sub(1).max(1))
    }

    pub fn all() -> impl Iterator<Item = StepId> {
        (1..=STEP_COUNT).map(StepId)
    }
}

impl TryFrom<u8> for StepId {
    type Error = TrainerError;
    fn try_from(id: u8) -> Result<Self, Self::Error> {
        StepId::new(id)
    }
}

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SubItem {
    pub id: &'static str,
    pub label: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProcedureStep {
    pub id: u8,
    pub title: &'static str,
    pub sub_items: &'static [SubItem],
}

const fn item(id: &'static str, label: &'static str) -> SubItem {
    SubItem { id, label }
}

pub static PROCEDURE_STEPS: [ProcedureStep; STEP_COUNT as usize] = [
    ProcedureStep {
        id: 1,
        title: "Patient Preparation and Identification",
        sub_items: &[
            item("1-a", "Professional attire (clothes, no jewellery, nails)"),
            item("1-b", "Check patient file and present yourself, talk to patient"),
            item("1-c", "Disinfect hands"),
            item("1-d", "Disinfect surface"),
            item(
                "1-e",
                "Gather materials: needle, holder, tubes, disinfectants, gloves, tourniquets, sharp container",
            ),
        ],
    },
    ProcedureStep {
        id: 2,
        title: "Site Preparation",
        sub_items: &[
            item(
                "2-a",
                "Disinfect hands with alcohol gel or water and soap. Put on non-sterile gloves",
            ),
            item("2-b", "Disinfect puncture site, leave at least 15 seconds"),
            item(
                "2-c",
                "Apply the tourniquet max 1 minute 10cm above puncture place, stimulate 'pumping' by patient to select puncture site",
            ),
            item("2-d", "Prepare needle & tubes"),
        ],
    },
    ProcedureStep {
        id: 3,
        title: "Needle Insertion",
        sub_items: &[
            item(
                "3-a",
                "Fixate the arm with non-dominant hand, thumb below puncture site",
            ),
            item("3-b", "Let the patient make a fist"),
            item("3-c", "Press START to begin monitoring"),
            item("3-d", "Insert needle at angle of 15-30°"),
        ],
    },
    ProcedureStep {
        id: 4,
        title: "Blood Collection",
        sub_items: &[
            item("4-a", "Insert tube & collect"),
            item("4-b", "Follow collection order"),
            item("4-c", "Release tourniquet"),
            item(
                "4-d",
                "Remove needle safely and dispose into a needle container",
            ),
            item("4-e", "Press STOP to end monitoring"),
            item(
                "4-f",
                "Apply post-puncture pressure for 3-5min with clean gauze",
            ),
            item("4-g", "Label tubes in a correct way"),
        ],
    },
    ProcedureStep {
        id: 5,
        title: "Aftercare",
        sub_items: &[
            item("5-a", "Dispose materials and disinfect hands"),
            item("5-b", "Position patient"),
            item(
                "5-c",
                "Document all samples and bring to the blood collection centre",
            ),
        ],
    },
];

pub fn step(id: StepId) -> &'static ProcedureStep {
    &PROCEDURE_STEPS[usize::from(id.get() - 1)]
}

/// Look up a sub-item by id across all steps.
pub fn find_sub_item(id: &str) -> Option<(StepId, &'static SubItem)> {
    StepId::all().find_map(|sid| {
        step(sid)
            .sub_items
            .iter()
            .find(|it| it.id == id)
            .map(|it| (sid, it))
    })
}
