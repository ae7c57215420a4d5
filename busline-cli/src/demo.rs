//! Scripted walk through the booking workflow: five actors, three trips, two
//! tickets taken through their whole lifecycle, and a few listings.

use anyhow::Context;
use busline_catalog::{NewTrip, SortBy, TripCatalog, TripSummary};
use busline_core::{Actor, Role};
use busline_order::{TicketDesk, TicketError, TicketEvent};
use chrono::NaiveDate;
use serde::Serialize;
use uuid::Uuid;

use crate::app_config::Config;

/// One `list_trips` call as seen by a given actor.
#[derive(Debug, Clone, Serialize)]
pub struct Listing {
    pub viewer: String,
    pub sort_by: Option<SortBy>,
    pub trips: Vec<TripSummary>,
}

#[derive(Debug, Default, Serialize)]
pub struct DemoReport {
    pub ticket_events: Vec<TicketEvent>,
    /// Transitions refused by the desk, as display strings.
    pub rejected: Vec<String>,
    pub listings: Vec<Listing>,
}

impl DemoReport {
    fn track(&mut self, result: Result<TicketEvent, TicketError>) {
        match result {
            Ok(event) => self.ticket_events.push(event),
            Err(err) => {
                tracing::warn!(error = %err, "Ticket transition rejected");
                self.rejected.push(err.to_string());
            }
        }
    }

    fn list(
        &mut self,
        catalog: &TripCatalog,
        viewer: &Actor,
        sort_by: Option<SortBy>,
    ) -> anyhow::Result<()> {
        let trips = catalog.list(viewer, sort_by)?;
        for row in &trips {
            tracing::info!(viewer = %viewer.name, sort_by = ?sort_by, "{}", row);
        }
        self.listings.push(Listing {
            viewer: viewer.name.clone(),
            sort_by,
            trips,
        });
        Ok(())
    }
}

fn date(y: i32, m: u32, d: u32) -> anyhow::Result<NaiveDate> {
    NaiveDate::from_ymd_opt(y, m, d).with_context(|| format!("invalid date {y}-{m}-{d}"))
}

fn schedule(
    price_cents: i32,
    departure: &str,
    departure_date: NaiveDate,
    arrival: &str,
    arrival_date: NaiveDate,
    total_seats: u32,
) -> NewTrip {
    NewTrip {
        price_cents,
        departure: departure.to_string(),
        departure_date,
        arrival: arrival.to_string(),
        arrival_date,
        total_seats,
    }
}

/// Take one ticket through create, request, approve, sell and refund.
fn ticket_round(
    report: &mut DemoReport,
    catalog: &mut TripCatalog,
    desk: &mut TicketDesk,
    trip_id: &Uuid,
    seats: u32,
    cast: [&Actor; 5],
    today: NaiveDate,
) -> anyhow::Result<()> {
    let [issuer, requester, approver, seller, refunder] = cast;
    let trip = catalog
        .get_mut(trip_id)
        .with_context(|| format!("trip {trip_id} disappeared"))?;

    let price = trip
        .quote(seats)
        .with_context(|| format!("price overflow for {seats} seats"))?;
    let ticket_id = match desk.create_ticket(issuer, trip, seats, price) {
        Ok(event) => {
            let id = event.ticket_id;
            report.ticket_events.push(event);
            id
        }
        Err(err) => {
            report.track(Err(err));
            return Ok(());
        }
    };

    report.track(desk.request_ticket(requester, trip, &ticket_id));
    report.track(desk.approve_ticket(approver, &ticket_id));
    report.track(desk.sell_ticket(seller, trip, &ticket_id));
    report.track(desk.refund_ticket_on(refunder, trip, &ticket_id, today));

    if let Some(ticket) = desk.get(&ticket_id) {
        tracing::info!("{}", ticket);
    }
    Ok(())
}

pub fn run(config: &Config, today: NaiveDate) -> anyhow::Result<DemoReport> {
    let policy = config
        .business_rules
        .policy()
        .context("Invalid business rules")?;
    let mut catalog = TripCatalog::with_policy(policy);
    let mut desk = TicketDesk::with_policy(policy);
    let mut report = DemoReport::default();

    let guest = Actor::new("John", "john.cena@user.com", Role::Guest);
    let user = Actor::new("Dwayne", "dwayne.howard@user.com", Role::Authorized);
    let trip_manager = Actor::new("Immanuel", "immanuel.kant@user.com", Role::TripManager);
    let bus_manager = Actor::new("Mario", "mario.ballotelli@user.com", Role::BusManager);
    let admin = Actor::new("Anthony", "anthony.joshua@user.com", Role::Superuser);
    for actor in [&guest, &user, &trip_manager, &bus_manager, &admin] {
        tracing::info!(capabilities = ?actor.capabilities(), "{}", actor);
    }

    let kyiv_poltava = catalog
        .create_trip(
            &trip_manager,
            schedule(14880, "Kyiv", date(2026, 6, 7)?, "Poltava", date(2026, 6, 8)?, 15),
        )?
        .trip_id;
    let lviv_ternopil = catalog
        .create_trip(
            &trip_manager,
            schedule(6700, "Lviv", date(2025, 10, 21)?, "Ternopil", date(2025, 10, 21)?, 32),
        )?
        .trip_id;

    report.list(&catalog, &guest, Some(SortBy::ArrivalDate))?;

    ticket_round(
        &mut report,
        &mut catalog,
        &mut desk,
        &kyiv_poltava,
        1,
        [&trip_manager, &user, &trip_manager, &bus_manager, &bus_manager],
        today,
    )?;
    ticket_round(
        &mut report,
        &mut catalog,
        &mut desk,
        &lviv_ternopil,
        5,
        [&admin, &user, &admin, &admin, &admin],
        today,
    )?;

    let odesa_uman = catalog
        .create_trip(
            &admin,
            schedule(10100, "Odesa", date(2024, 11, 19)?, "Uman", date(2024, 11, 19)?, 32),
        )?
        .trip_id;

    report.list(&catalog, &user, None)?;
    report.list(&catalog, &user, Some(SortBy::ArrivalDate))?;

    for (trip_id, scores) in [
        (&odesa_uman, [(&user, 4.3), (&guest, 4.9)]),
        (&kyiv_poltava, [(&user, 4.9), (&guest, 4.1)]),
        (&lviv_ternopil, [(&user, 4.5), (&guest, 2.8)]),
    ] {
        for (scorer, score) in scores {
            catalog.rate_trip(scorer, trip_id, score)?;
        }
    }

    report.list(&catalog, &user, Some(SortBy::Rating))?;
    Ok(report)
}
