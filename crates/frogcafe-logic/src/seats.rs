//! Seat registry.
//!
//! Seats live in a fixed arena and are referred to by [`SeatId`]. A seat is
//! occupied exactly between a successful [`SeatRegistry::try_assign`] and the
//! matching [`SeatRegistry::notify_freed`]. Freeing a seat never promotes
//! anyone from the queue; customers are seated only after their order has
//! been taken.

use serde::{Deserialize, Serialize};

use crate::geometry::Vec2;

/// Stable handle to a seat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SeatId(pub usize);

#[derive(Debug, Clone)]
pub struct Seat<C> {
    pub id: SeatId,
    pub point: Vec2,
    occupant: Option<C>,
}

impl<C: Copy> Seat<C> {
    pub fn is_occupied(&self) -> bool {
        self.occupant.is_some()
    }

    pub fn occupant(&self) -> Option<C> {
        self.occupant
    }
}

#[derive(Debug, Clone)]
pub struct SeatRegistry<C> {
    seats: Vec<Seat<C>>,
}

impl<C: Copy + PartialEq> SeatRegistry<C> {
    pub fn new(points: &[Vec2]) -> Self {
        Self {
            seats: points
                .iter()
                .enumerate()
                .map(|(i, p)| Seat {
                    id: SeatId(i),
                    point: *p,
                    occupant: None,
                })
                .collect(),
        }
    }

    /// First-free allocation. Marks the seat occupied before returning it.
    pub fn try_assign(&mut self, customer: C) -> Option<SeatId> {
        debug_assert!(
            !self.seats.iter().any(|s| s.occupant == Some(customer)),
            "customer already holds a seat"
        );
        let seat = self.seats.iter_mut().find(|s| s.occupant.is_none())?;
        seat.occupant = Some(customer);
        Some(seat.id)
    }

    /// Mark a seat free. Does not seat anyone else.
    pub fn notify_freed(&mut self, id: SeatId) {
        if let Some(seat) = self.seats.get_mut(id.0) {
            seat.occupant = None;
        }
    }

    /// Free whatever seat `customer` holds. Returns the seat if there was one.
    pub fn release_by(&mut self, customer: C) -> Option<SeatId> {
        let seat = self.seats.iter_mut().find(|s| s.occupant == Some(customer))?;
        seat.occupant = None;
        Some(seat.id)
    }

    pub fn seat(&self, id: SeatId) -> Option<&Seat<C>> {
        self.seats.get(id.0)
    }

    pub fn point(&self, id: SeatId) -> Option<Vec2> {
        self.seat(id).map(|s| s.point)
    }

    pub fn seat_of(&self, customer: C) -> Option<SeatId> {
        self.seats
            .iter()
            .find(|s| s.occupant == Some(customer))
            .map(|s| s.id)
    }

    pub fn occupied_count(&self) -> usize {
        self.seats.iter().filter(|s| s.is_occupied()).count()
    }

    pub fn free_count(&self) -> usize {
        self.seats.len() - self.occupied_count()
    }

    pub fn len(&self) -> usize {
        self.seats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seats.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Seat<C>> {
        self.seats.iter()
    }

    /// Free every seat.
    pub fn clear(&mut self) {
        for seat in &mut self.seats {
            seat.occupant = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_seats() -> SeatRegistry<u32> {
        SeatRegistry::new(&[Vec2::new(1.0, 1.0), Vec2::new(2.0, 1.0)])
    }

    #[test]
    fn test_first_free_allocation() {
        let mut seats = two_seats();
        assert_eq!(seats.try_assign(1), Some(SeatId(0)));
        assert_eq!(seats.try_assign(2), Some(SeatId(1)));
        assert_eq!(seats.try_assign(3), None);
        assert_eq!(seats.occupied_count(), 2);
    }

    #[test]
    fn test_freed_seat_is_reassigned() {
        let mut seats = two_seats();
        seats.try_assign(1);
        seats.try_assign(2);

        seats.notify_freed(SeatId(1));
        assert_eq!(seats.free_count(), 1);
        assert_eq!(seats.try_assign(3), Some(SeatId(1)));
        assert_eq!(seats.seat(SeatId(1)).and_then(|s| s.occupant()), Some(3));
    }

    #[test]
    fn test_release_by_customer() {
        let mut seats = two_seats();
        seats.try_assign(1);
        assert_eq!(seats.seat_of(1), Some(SeatId(0)));
        assert_eq!(seats.release_by(1), Some(SeatId(0)));
        assert_eq!(seats.release_by(1), None);
        assert_eq!(seats.occupied_count(), 0);
    }

    #[test]
    fn test_no_seats_never_assigns() {
        let mut seats: SeatRegistry<u32> = SeatRegistry::new(&[]);
        assert!(seats.is_empty());
        assert_eq!(seats.try_assign(1), None);
        seats.notify_freed(SeatId(3)); // unknown id is ignored
    }
}
