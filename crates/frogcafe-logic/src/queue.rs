//! Queue coordinator: the FIFO line in front of the counter.
//!
//! The line is the single source of truth for who is served next. Rank is a
//! customer's index in the line (0 = front of queue), never derived from
//! where customers happen to be standing or the order they are ticked in.
//!
//! # Rank → position
//!
//! | Rank | Stands at |
//! |------|-----------|
//! | 0 | the counter point (front of queue, eligible for order-taking) |
//! | r ≥ 1 | queue slot r−1, slot 0 being the counter-most queue point |
//! | beyond the last slot | the back-most queue point (shared approach, cells arbitrate) |
//!
//! Queue points are configured back → front. With no queue points the
//! coordinator runs in a degraded mode and computes positions behind the
//! counter, alternating right/left and stepping back once per pair of ranks.
//!
//! Every mutation returns the full set of [`QueueAssignment`]s produced by
//! the reposition pass; the caller turns them into movement commands.

use std::collections::VecDeque;

use crate::geometry::Vec2;

/// A movement command produced by a reposition pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QueueAssignment<C> {
    pub customer: C,
    pub rank: usize,
    pub target: Vec2,
}

#[derive(Debug, Clone)]
pub struct QueueCoordinator<C> {
    line: VecDeque<C>,
    counter: Vec2,
    /// Configured back → front.
    points: Vec<Vec2>,
    fallback_spacing: f32,
}

impl<C: Copy + PartialEq> QueueCoordinator<C> {
    pub fn new(counter: Vec2, queue_points: Vec<Vec2>, fallback_spacing: f32) -> Self {
        if queue_points.is_empty() {
            log::warn!(
                "QueueCoordinator: no queue points configured, using computed positions behind the counter {}",
                counter
            );
        }
        Self {
            line: VecDeque::new(),
            counter,
            points: queue_points,
            fallback_spacing,
        }
    }

    /// Make `customer` front of queue without a reposition pass.
    ///
    /// Only succeeds on an empty line (or if `customer` already is the front);
    /// this is the fast path for the first arrival at an idle counter.
    pub fn claim_front(&mut self, customer: C) -> bool {
        match self.line.front() {
            None => {
                self.line.push_back(customer);
                true
            }
            Some(front) => *front == customer,
        }
    }

    /// Append to the back of the line. No-op if already enrolled.
    pub fn enroll(&mut self, customer: C) -> Vec<QueueAssignment<C>> {
        if self.contains(customer) {
            return Vec::new();
        }
        self.line.push_back(customer);
        log::debug!("queue: enrolled at rank {}", self.line.len() - 1);
        self.reposition()
    }

    /// Remove from anywhere in the line. No-op if not enrolled.
    pub fn remove(&mut self, customer: C) -> Vec<QueueAssignment<C>> {
        let Some(idx) = self.line.iter().position(|c| *c == customer) else {
            return Vec::new();
        };
        self.line.remove(idx);
        log::debug!("queue: removed from rank {}", idx);
        self.reposition()
    }

    /// Remove and return the front of the line.
    pub fn pop_front(&mut self) -> Option<(C, Vec<QueueAssignment<C>>)> {
        let front = self.line.pop_front()?;
        Some((front, self.reposition()))
    }

    /// Assign every customer the position for its rank, front to back.
    pub fn reposition(&self) -> Vec<QueueAssignment<C>> {
        self.line
            .iter()
            .enumerate()
            .map(|(rank, customer)| QueueAssignment {
                customer: *customer,
                rank,
                target: self.position_for_rank(rank),
            })
            .collect()
    }

    /// World position a customer of the given rank should stand at.
    pub fn position_for_rank(&self, rank: usize) -> Vec2 {
        if rank == 0 {
            return self.counter;
        }
        let slot = rank - 1;
        if self.points.is_empty() {
            return self.fallback_position(rank);
        }
        let from_front = slot.min(self.points.len() - 1);
        self.points[self.points.len() - 1 - from_front]
    }

    fn fallback_position(&self, rank: usize) -> Vec2 {
        let pairs = rank.div_ceil(2) as f32;
        let side = if rank % 2 == 1 { 1.0 } else { -1.0 };
        self.counter
            + Vec2::DOWN * (self.fallback_spacing * pairs)
            + Vec2::RIGHT * (self.fallback_spacing * 0.5 * side)
    }

    pub fn front(&self) -> Option<C> {
        self.line.front().copied()
    }

    pub fn is_front(&self, customer: C) -> bool {
        self.line.front() == Some(&customer)
    }

    pub fn rank_of(&self, customer: C) -> Option<usize> {
        self.line.iter().position(|c| *c == customer)
    }

    pub fn contains(&self, customer: C) -> bool {
        self.line.contains(&customer)
    }

    pub fn len(&self) -> usize {
        self.line.len()
    }

    pub fn is_empty(&self) -> bool {
        self.line.is_empty()
    }

    /// Customers front to back.
    pub fn iter(&self) -> impl Iterator<Item = C> + '_ {
        self.line.iter().copied()
    }

    pub fn clear(&mut self) {
        self.line.clear();
    }

    pub fn counter_point(&self) -> Vec2 {
        self.counter
    }

    /// Whether scene queue points are configured (false = degraded mode).
    pub fn has_queue_points(&self) -> bool {
        !self.points.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coordinator() -> QueueCoordinator<u32> {
        // back -> front
        let points = vec![
            Vec2::new(0.0, -3.0),
            Vec2::new(0.0, -2.0),
            Vec2::new(0.0, -1.0),
        ];
        QueueCoordinator::new(Vec2::ZERO, points, 0.6)
    }

    #[test]
    fn test_fifo_pop_order() {
        let mut q = coordinator();
        q.enroll(1);
        q.enroll(2);
        q.enroll(3);

        assert_eq!(q.pop_front().map(|(c, _)| c), Some(1));
        assert_eq!(q.pop_front().map(|(c, _)| c), Some(2));
        assert_eq!(q.front(), Some(3));
    }

    #[test]
    fn test_enroll_twice_is_noop() {
        let mut q = coordinator();
        assert_eq!(q.enroll(1).len(), 1);
        assert!(q.enroll(1).is_empty());
        assert_eq!(q.len(), 1);
    }

    #[test]
    fn test_remove_from_middle_reranks() {
        let mut q = coordinator();
        q.enroll(1);
        q.enroll(2);
        q.enroll(3);

        let assignments = q.remove(2);
        assert_eq!(assignments.len(), 2);
        assert_eq!(assignments[1].customer, 3);
        assert_eq!(assignments[1].rank, 1);
        assert_eq!(q.rank_of(3), Some(1));
        assert!(q.remove(42).is_empty());
    }

    #[test]
    fn test_rank_positions_and_clamping() {
        let q = coordinator();
        assert_eq!(q.position_for_rank(0), Vec2::ZERO);
        assert_eq!(q.position_for_rank(1), Vec2::new(0.0, -1.0));
        assert_eq!(q.position_for_rank(3), Vec2::new(0.0, -3.0));
        // beyond the last slot clamps to the back-most point
        assert_eq!(q.position_for_rank(7), Vec2::new(0.0, -3.0));
    }

    #[test]
    fn test_claim_front_only_on_empty_line() {
        let mut q = coordinator();
        assert!(q.claim_front(5));
        assert!(q.claim_front(5));
        assert!(!q.claim_front(6));
        assert!(q.is_front(5));
    }

    #[test]
    fn test_fallback_positions_alternate() {
        let q: QueueCoordinator<u32> = QueueCoordinator::new(Vec2::new(5.0, 5.0), vec![], 1.0);
        assert!(!q.has_queue_points());
        assert_eq!(q.position_for_rank(0), Vec2::new(5.0, 5.0));
        assert_eq!(q.position_for_rank(1), Vec2::new(5.5, 4.0));
        assert_eq!(q.position_for_rank(2), Vec2::new(4.5, 4.0));
        assert_eq!(q.position_for_rank(3), Vec2::new(5.5, 3.0));
    }
}
