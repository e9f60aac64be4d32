//! The four assistance intents the user can ask for.
//!
//! A [`Task`] decides which prompt is sent to the image model, whether the
//! request is enriched with the user's location, and whether the task runs
//! the two-step shop sub-dialog before analysis.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Model prompts
// ---------------------------------------------------------------------------

const PROMPT_FIND_BUS: &str = "\
You are helping a visually impaired pedestrian at a bus stop. Look at the image \
and report any bus you can see: its route number, destination sign, and how far \
away it is. If no bus is visible, say so clearly. Keep the answer to two short sentences.";

const PROMPT_CROSS_ROAD: &str = "\
You are helping a visually impaired pedestrian who wants to cross the road. \
Describe the state of any pedestrian signal, approaching vehicles, and whether \
there is a crosswalk ahead. Put safety first: if you are unsure, tell them to wait. \
Keep the answer to two short sentences.";

const PROMPT_EXPLORE: &str = "\
You are the eyes of a visually impaired pedestrian. Describe the surroundings in \
the image: the path ahead, obstacles, landmarks, and signs worth knowing about. \
Keep the answer to three short sentences.";

const PROMPT_FIND_SHOP: &str = "\
You are helping a visually impaired pedestrian find a shop. Look at the storefronts \
and signs in the image and say where the requested shop is relative to the camera, \
or that it is not visible. Keep the answer to two short sentences.";

// ---------------------------------------------------------------------------
// Task
// ---------------------------------------------------------------------------

/// One of the supported assistance intents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Task {
    FindBus,
    CrossRoad,
    Explore,
    FindShop,
}

impl Task {
    /// All tasks in declared order.
    ///
    /// Voice command resolution walks this array, so the order is also the
    /// tie-break order when a transcript matches more than one task.
    pub const ALL: [Task; 4] = [Task::FindBus, Task::CrossRoad, Task::Explore, Task::FindShop];

    /// Position of the task inside [`Task::ALL`].
    pub fn index(self) -> usize {
        match self {
            Task::FindBus => 0,
            Task::CrossRoad => 1,
            Task::Explore => 2,
            Task::FindShop => 3,
        }
    }

    /// Base instruction sent to the image model for this task.
    pub fn prompt(self) -> &'static str {
        match self {
            Task::FindBus => PROMPT_FIND_BUS,
            Task::CrossRoad => PROMPT_CROSS_ROAD,
            Task::Explore => PROMPT_EXPLORE,
            Task::FindShop => PROMPT_FIND_SHOP,
        }
    }

    /// `true` for the task that asks the user a follow-up question before
    /// any frame is analysed.
    pub fn has_sub_dialog(self) -> bool {
        matches!(self, Task::FindShop)
    }

    /// `true` when the last known location is attached to the request.
    pub fn uses_location(self) -> bool {
        matches!(self, Task::FindShop | Task::Explore)
    }
}

impl std::fmt::Display for Task {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Task::FindBus => "find-bus",
            Task::CrossRoad => "cross-road",
            Task::Explore => "explore",
            Task::FindShop => "find-shop",
        };
        f.write_str(name)
    }
}
