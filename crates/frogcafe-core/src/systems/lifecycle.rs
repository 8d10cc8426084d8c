//! Customer lifecycle system - drives each visit from spawn to exit.
//!
//! The state machine is polled once per tick. Waiting (for a path to
//! finish, for the order to be taken, for service) is just a state that
//! persists across ticks until the condition is observed.

use frogcafe_logic::config::CafeConfig;
use frogcafe_logic::geometry::Vec2;
use frogcafe_logic::pathfinding::seat_detour_waypoint;
use frogcafe_logic::progress::{DayProgress, FailureReason};
use frogcafe_logic::queue::QueueAssignment;
use hecs::{Entity, World};

use super::movement::{command_move, MoveOrder};
use crate::components::{CellClaim, Customer, CustomerState, LeaveReason, Movement, Position};
use crate::events::CafeEvent;
use crate::services::CafeServices;

fn is_moving(world: &World, entity: Entity) -> bool {
    world.get::<&Movement>(entity).is_ok()
}

fn position_of(world: &World, entity: Entity) -> Vec2 {
    world
        .get::<&Position>(entity)
        .map(|p| p.point)
        .unwrap_or_default()
}

fn state_of(world: &World, entity: Entity) -> Option<CustomerState> {
    world.get::<&Customer>(entity).ok().map(|c| c.state)
}

/// Change state, logging the transition.
pub fn set_state(world: &mut World, entity: Entity, state: CustomerState) {
    if let Ok(mut customer) = world.get::<&mut Customer>(entity) {
        log::debug!(
            "customer #{}: {} -> {}",
            customer.serial,
            customer.state.name(),
            state.name()
        );
        customer.state = state;
    }
}

/// Turn a reposition pass into movement commands for enrolled customers.
pub fn apply_queue_assignments(
    world: &mut World,
    services: &CafeServices,
    config: &CafeConfig,
    assignments: &[QueueAssignment<Entity>],
) {
    for a in assignments {
        if state_of(world, a.customer) != Some(CustomerState::Enrolled) {
            continue;
        }
        let heading = world.get::<&Movement>(a.customer).ok().map(|m| m.destination);
        if heading == Some(a.target) {
            continue;
        }
        if heading.is_none() && position_of(world, a.customer).distance(&a.target) <= config.arrive_threshold {
            continue;
        }
        log::debug!("queue: {:?} rank {} -> {}", a.customer, a.rank, a.target);
        command_move(world, services, config, a.customer, a.target, None);
    }
}

fn enroll(world: &mut World, services: &mut CafeServices, config: &CafeConfig, entity: Entity) {
    set_state(world, entity, CustomerState::Enrolled);
    let assignments = services.queue.enroll(entity);
    apply_queue_assignments(world, services, config, &assignments);
}

/// Front of the line and standing at the counter.
fn reach_counter(world: &mut World, entity: Entity) {
    let _ = world.remove_one::<Movement>(entity);
    let order_taken = world
        .get::<&Customer>(entity)
        .map(|c| c.order_taken)
        .unwrap_or(false);
    let next = if order_taken {
        CustomerState::AssigningSeat
    } else {
        CustomerState::AwaitingOrder
    };
    set_state(world, entity, next);
}

/// Start the walk out. Frees the seat and queue slot right away; the
/// customer is deactivated on reaching the exit, or now if it can't.
pub fn begin_leaving(
    world: &mut World,
    services: &mut CafeServices,
    config: &CafeConfig,
    progress: &mut DayProgress,
    events: &mut Vec<CafeEvent>,
    entity: Entity,
    reason: LeaveReason,
) {
    let (serial, seat) = match world.get::<&mut Customer>(entity) {
        Ok(mut customer) => {
            customer.linger = None;
            (customer.serial, customer.seat.take())
        }
        Err(_) => return,
    };
    set_state(world, entity, CustomerState::Leaving(reason));

    if let Some(seat) = seat {
        services.seats.notify_freed(seat);
    }
    let assignments = services.queue.remove(entity);
    apply_queue_assignments(world, services, config, &assignments);

    events.push(CafeEvent::CustomerLeaving {
        customer: entity,
        reason,
    });
    if reason == LeaveReason::Impatient {
        log::info!("Customer #{} left without being served", serial);
        progress.end_run_failure(FailureReason::LostCustomer);
    }

    let exit = services.exit_point;
    match command_move(world, services, config, entity, exit, None) {
        MoveOrder::Moving => {}
        MoveOrder::AlreadyThere | MoveOrder::Unreachable => {
            deactivate_customer(world, services, config, events, entity);
        }
    }
}

/// Return a customer to the pool, releasing every cell, its seat and its
/// queue slot. Safe to call in any state.
pub fn deactivate_customer(
    world: &mut World,
    services: &mut CafeServices,
    config: &CafeConfig,
    events: &mut Vec<CafeEvent>,
    entity: Entity,
) {
    let released = services.reservations.release_all(entity);
    services.seats.release_by(entity);
    let assignments = services.queue.remove(entity);

    let _ = world.remove_one::<Movement>(entity);
    if let Ok(mut claim) = world.get::<&mut CellClaim>(entity) {
        *claim = CellClaim::default();
    }
    if let Ok(mut customer) = world.get::<&mut Customer>(entity) {
        log::debug!(
            "customer #{}: {} -> Inactive ({} cells released)",
            customer.serial,
            customer.state.name(),
            released
        );
        customer.state = CustomerState::Inactive;
        customer.seat = None;
        customer.linger = None;
    }
    events.push(CafeEvent::CustomerDeparted { customer: entity });

    apply_queue_assignments(world, services, config, &assignments);
}

fn travel_to_counter(world: &mut World, services: &mut CafeServices, config: &CafeConfig, entity: Entity) {
    let blocked_on = world.get::<&Movement>(entity).ok().map(|m| m.blocked_on);
    if let Some(blocked_on) = blocked_on {
        // Stuck behind someone already in line: join the line from here.
        let blocker = blocked_on.and_then(|cell| services.reservations.owner(cell));
        if blocker.is_some_and(|other| other != entity && services.queue.contains(other)) {
            enroll(world, services, config, entity);
        }
        return;
    }

    let pos = position_of(world, entity);
    if services.queue.claim_front(entity) {
        if services.at_counter(pos, config.counter_tolerance) {
            reach_counter(world, entity);
        } else {
            set_state(world, entity, CustomerState::Enrolled);
            let counter = services.counter_point;
            command_move(world, services, config, entity, counter, None);
        }
    } else {
        enroll(world, services, config, entity);
    }
}

fn update_enrolled(world: &mut World, services: &mut CafeServices, config: &CafeConfig, entity: Entity) {
    if is_moving(world, entity) {
        return;
    }
    let order_taken = world
        .get::<&Customer>(entity)
        .map(|c| c.order_taken)
        .unwrap_or(false);
    if order_taken && services.seats.free_count() > 0 {
        // Already ordered: leave the line from this slot for the free seat.
        set_state(world, entity, CustomerState::AssigningSeat);
        assign_seat(world, services, config, entity);
        return;
    }
    let pos = position_of(world, entity);
    match services.queue.rank_of(entity) {
        Some(0) => {
            if services.at_counter(pos, config.counter_tolerance) {
                reach_counter(world, entity);
            } else {
                let counter = services.counter_point;
                command_move(world, services, config, entity, counter, None);
            }
        }
        Some(rank) => {
            let target = services.queue.position_for_rank(rank);
            if pos.distance(&target) > config.arrive_threshold {
                command_move(world, services, config, entity, target, None);
            }
        }
        None => enroll(world, services, config, entity),
    }
}

fn assign_seat(world: &mut World, services: &mut CafeServices, config: &CafeConfig, entity: Entity) {
    // Orders are taken at the front, which has already left the line.
    let rank = services.queue.rank_of(entity).unwrap_or(0);
    let assignments = services.queue.remove(entity);
    apply_queue_assignments(world, services, config, &assignments);

    let Some(seat) = services.seats.try_assign(entity) else {
        log::trace!("{:?}: no free seat, back in line", entity);
        enroll(world, services, config, entity);
        return;
    };
    let Some(seat_point) = services.seats.point(seat) else {
        services.seats.notify_freed(seat);
        enroll(world, services, config, entity);
        return;
    };

    if let Ok(mut customer) = world.get::<&mut Customer>(entity) {
        customer.prior_rank = rank;
        customer.seat = Some(seat);
        log::debug!("customer #{}: assigned seat {:?} from rank {}", customer.serial, seat, rank);
    }

    let pos = position_of(world, entity);
    let via = seat_detour_waypoint(
        pos,
        seat_point,
        rank,
        config.seat_forward_step,
        config.seat_lateral_spacing,
    );
    set_state(world, entity, CustomerState::TravelingToSeat);
    command_move(world, services, config, entity, seat_point, Some(via));
}

fn arrive_at_seat(world: &mut World, services: &CafeServices, config: &CafeConfig, events: &mut Vec<CafeEvent>, entity: Entity) {
    let Some(seat) = world.get::<&Customer>(entity).ok().and_then(|c| c.seat) else {
        return;
    };
    if let (Some(point), Ok(mut pos)) = (services.seats.point(seat), world.get::<&mut Position>(entity)) {
        pos.point = point;
    }
    if let Ok(mut customer) = world.get::<&mut Customer>(entity) {
        customer.patience = config.patience;
    }
    set_state(world, entity, CustomerState::Seated);
    events.push(CafeEvent::CustomerSeated {
        customer: entity,
        seat,
    });
}

/// Count down linger or patience. Returns the reason to leave, if any.
fn tick_seated(world: &mut World, entity: Entity, dt: f32) -> Option<LeaveReason> {
    let mut customer = world.get::<&mut Customer>(entity).ok()?;
    if customer.served {
        let linger = customer.linger.get_or_insert(0.0);
        *linger -= dt;
        return (*linger <= 0.0).then_some(LeaveReason::Served);
    }
    customer.patience -= dt;
    if customer.patience <= 0.0 {
        customer.patience = 0.0;
        return Some(LeaveReason::Impatient);
    }
    None
}

/// Poll every active customer's state machine, in entity-id order.
pub fn lifecycle_system(
    world: &mut World,
    services: &mut CafeServices,
    config: &CafeConfig,
    progress: &mut DayProgress,
    events: &mut Vec<CafeEvent>,
    dt: f32,
) {
    let mut customers: Vec<Entity> = world
        .query::<&Customer>()
        .iter()
        .filter(|(_, c)| c.state.is_active())
        .map(|(e, _)| e)
        .collect();
    customers.sort_by_key(|e| e.id());

    for entity in customers {
        // Earlier customers this tick may have changed our state.
        let Some(state) = state_of(world, entity) else {
            continue;
        };
        match state {
            CustomerState::Spawned => {
                set_state(world, entity, CustomerState::TravelingToCounter);
                let counter = services.counter_point;
                command_move(world, services, config, entity, counter, None);
            }
            CustomerState::TravelingToCounter => travel_to_counter(world, services, config, entity),
            CustomerState::Enrolled => update_enrolled(world, services, config, entity),
            CustomerState::AssigningSeat => assign_seat(world, services, config, entity),
            CustomerState::TravelingToSeat => {
                if !is_moving(world, entity) {
                    arrive_at_seat(world, services, config, events, entity);
                }
            }
            CustomerState::Seated => {
                if let Some(reason) = tick_seated(world, entity, dt) {
                    begin_leaving(world, services, config, progress, events, entity, reason);
                }
            }
            CustomerState::AwaitingOrder | CustomerState::Leaving(_) | CustomerState::Inactive => {}
        }
    }
}

/// Return customers that reached the exit to the pool.
pub fn departure_system(
    world: &mut World,
    services: &mut CafeServices,
    config: &CafeConfig,
    events: &mut Vec<CafeEvent>,
) {
    let mut arrived: Vec<Entity> = world
        .query::<&Customer>()
        .without::<&Movement>()
        .iter()
        .filter(|(_, c)| matches!(c.state, CustomerState::Leaving(_)))
        .map(|(e, _)| e)
        .collect();
    arrived.sort_by_key(|e| e.id());
    for entity in arrived {
        deactivate_customer(world, services, config, events, entity);
    }
}
