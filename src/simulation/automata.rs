//! Vehicle agent movement
//!
//! An automata rides one track at a time. `root_node` is the node it came
//! from, which fixes its direction on the (undirected) track. At the far
//! end it picks the next track incident to the exit node, preferring tracks
//! wired to start there.

use log::{debug, warn};
use rand::seq::IndexedRandom;
use rand::Rng;

use super::lane_graph::LaneGraph;
use super::types::{AutomataId, LaneNodeId, Position, TrackId};

/// Result of a vehicle step indicating what happened
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepResult {
    /// Still travelling along the current track
    Moved,
    /// Held at the end of the current track
    Waiting,
    /// Moved onto a new track
    Branched(TrackId),
    /// No way forward; the vehicle should be despawned
    DeadEnd,
}

/// A vehicle agent in the traffic simulation
#[derive(Debug, Clone)]
pub struct Automata {
    pub id: AutomataId,
    pub position: Position,
    /// Y-axis rotation toward the exit node
    pub heading: f32,
    pub distance_along_track: f32,
    pub current_track: TrackId,
    /// Node most recently departed from
    pub root_node: LaneNodeId,
    pub marked_for_removal: bool,
}

impl Automata {
    /// Places a new vehicle at the start node of `track` and registers it there.
    /// Returns `None` if the track does not exist.
    pub fn spawn(id: AutomataId, track: TrackId, graph: &mut LaneGraph) -> Option<Self> {
        let (root_node, exit_node) = {
            let track = graph.track(track)?;
            (track.start_node, track.end_node)
        };
        let position = graph.node(root_node)?.position;
        let heading = graph
            .node(exit_node)
            .map(|exit| position.angle_to(&exit.position))
            .unwrap_or(0.0);

        graph.attach_vehicle(track, id);

        Some(Self {
            id,
            position,
            heading,
            distance_along_track: 0.0,
            current_track: track,
            root_node,
            marked_for_removal: false,
        })
    }

    /// The endpoint of the current track the vehicle is driving toward
    pub fn exit_node(&self, graph: &LaneGraph) -> Option<LaneNodeId> {
        graph
            .track(self.current_track)
            .and_then(|track| track.other_end(self.root_node))
    }

    /// Advance the vehicle by `speed * delta_secs` along the graph
    pub fn step<R: Rng + ?Sized>(
        &mut self,
        delta_secs: f32,
        speed: f32,
        max_branch_attempts: u32,
        graph: &mut LaneGraph,
        rng: &mut R,
    ) -> StepResult {
        let Some((length, exit_node)) = graph
            .track(self.current_track)
            .and_then(|track| Some((track.length, track.other_end(self.root_node)?)))
        else {
            debug_assert!(false, "vehicle {:?} lost its track", self.id);
            warn!(
                "Vehicle {:?} is not on a valid track, removing it",
                self.id
            );
            return self.mark_dead_end();
        };

        self.distance_along_track += speed * delta_secs;

        if self.distance_along_track < length {
            self.place_on(graph, self.root_node, exit_node, length);
            return StepResult::Moved;
        }

        if graph.is_blocked(exit_node) {
            self.distance_along_track = length;
            return StepResult::Waiting;
        }

        let candidates: Vec<TrackId> = graph
            .tracks_at(exit_node)
            .iter()
            .copied()
            .filter(|id| *id != self.current_track)
            .collect();

        // Tracks wired away from the exit node keep the vehicle in its lane;
        // the rest are only taken when nothing leads forward
        let forward: Vec<TrackId> = candidates
            .iter()
            .copied()
            .filter(|id| graph.track(*id).is_some_and(|track| track.start_node == exit_node))
            .collect();
        let candidates = if forward.is_empty() { candidates } else { forward };

        let next = match candidates.as_slice() {
            [] => return self.mark_dead_end(),
            [only] => Some(*only),
            _ => self.pick_open_branch(&candidates, exit_node, max_branch_attempts, graph, rng),
        };

        let Some(next) = next else {
            debug!(
                "Vehicle {:?} found no open branch in {} attempts, waiting",
                self.id, max_branch_attempts
            );
            self.distance_along_track = length;
            return StepResult::Waiting;
        };

        let Some((next_length, next_exit)) = graph
            .track(next)
            .and_then(|track| Some((track.length, track.other_end(exit_node)?)))
        else {
            return self.mark_dead_end();
        };

        graph.detach_vehicle(self.current_track, self.id);
        graph.attach_vehicle(next, self.id);

        self.root_node = exit_node;
        self.distance_along_track = (self.distance_along_track - length).clamp(0.0, next_length);
        self.current_track = next;
        self.place_on(graph, exit_node, next_exit, next_length);

        StepResult::Branched(next)
    }

    /// Random candidate search bounded by `max_attempts`.
    /// A candidate is open when its far endpoint is not blocked.
    fn pick_open_branch<R: Rng + ?Sized>(
        &self,
        candidates: &[TrackId],
        exit_node: LaneNodeId,
        max_attempts: u32,
        graph: &LaneGraph,
        rng: &mut R,
    ) -> Option<TrackId> {
        for _ in 0..max_attempts {
            let candidate = *candidates.choose(rng)?;
            let far_open = graph
                .track(candidate)
                .and_then(|track| track.other_end(exit_node))
                .is_some_and(|far| !graph.is_blocked(far));
            if far_open {
                return Some(candidate);
            }
        }
        None
    }

    /// Interpolate position between `from` and `to` by distance travelled
    fn place_on(&mut self, graph: &LaneGraph, from: LaneNodeId, to: LaneNodeId, length: f32) {
        let (Some(from), Some(to)) = (graph.node(from), graph.node(to)) else {
            return;
        };
        let progress = if length > 0.0 {
            self.distance_along_track / length
        } else {
            1.0
        };
        self.position = from.position.lerp(&to.position, progress);
        self.heading = from.position.angle_to(&to.position);
    }

    fn mark_dead_end(&mut self) -> StepResult {
        self.marked_for_removal = true;
        StepResult::DeadEnd
    }
}
