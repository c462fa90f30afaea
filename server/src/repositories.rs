//! SQL access for events, artists, and resources.
//!
//! Repositories are thin pass-throughs from typed request payloads to SQL.
//! They return [`sqlx::Error`] untouched; mapping store failures onto HTTP
//! statuses happens once at the boundary in [`crate::error`].
//!
//! Eager-loading is a follow-up query per relation: the row is fetched first,
//! then its related rows, and the pair is assembled into the response shape.

use sqlx::SqlitePool;

use crate::config::DeletePolicy;
use crate::models::{
    Artist, ArtistWithEvent, CreateArtist, CreateEvent, CreateEventResource, CreateResource,
    Event, EventWithRelations, Resource, ResourceWithEvent, UpdateArtist, UpdateEvent,
    UpdateResource,
};

/// Outcome of deleting an event under the configured policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventDeleteOutcome {
    /// The event (and, under cascade, its dependents) was removed.
    Deleted,

    /// No event with that id exists.
    NotFound,

    /// The restrict policy refused the delete because artists or resources
    /// still reference the event.
    HasDependents,
}

/// Fetches the parent event of a child row.
///
/// The foreign-key constraint guarantees the parent exists; a miss here is a
/// store inconsistency and surfaces as a row-not-found error.
async fn parent_event(pool: &SqlitePool, event_id: i64) -> Result<Event, sqlx::Error> {
    EventRepository::get_row(pool, event_id)
        .await?
        .ok_or(sqlx::Error::RowNotFound)
}

// ============================================================================
// Events
// ============================================================================

/// Queries for the `events` table.
pub struct EventRepository;

impl EventRepository {
    /// Lists every event together with its artists and resources.
    pub async fn list(pool: &SqlitePool) -> Result<Vec<EventWithRelations>, sqlx::Error> {
        let events = sqlx::query_as::<_, Event>("SELECT * FROM events ORDER BY id")
            .fetch_all(pool)
            .await?;

        let mut loaded = Vec::with_capacity(events.len());
        for event in events {
            let artists = ArtistRepository::list_for_event(pool, event.id).await?;
            let resources = ResourceRepository::list_for_event(pool, event.id).await?;
            loaded.push(EventWithRelations {
                event,
                artists,
                resources,
            });
        }

        Ok(loaded)
    }

    /// Fetches one event together with its artists and resources.
    pub async fn get(
        pool: &SqlitePool,
        id: i64,
    ) -> Result<Option<EventWithRelations>, sqlx::Error> {
        let Some(event) = Self::get_row(pool, id).await? else {
            return Ok(None);
        };

        let artists = ArtistRepository::list_for_event(pool, event.id).await?;
        let resources = ResourceRepository::list_for_event(pool, event.id).await?;

        Ok(Some(EventWithRelations {
            event,
            artists,
            resources,
        }))
    }

    /// Fetches one event row without relations.
    pub async fn get_row(pool: &SqlitePool, id: i64) -> Result<Option<Event>, sqlx::Error> {
        sqlx::query_as::<_, Event>("SELECT * FROM events WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Inserts a new event and returns the stored row.
    pub async fn create(pool: &SqlitePool, body: CreateEvent) -> Result<Event, sqlx::Error> {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO events (name, location, forecast, start_date, end_date, budget) \
             VALUES (?, ?, ?, ?, ?, ?) RETURNING id",
        )
        .bind(&body.name)
        .bind(&body.location)
        .bind(&body.forecast)
        .bind(body.start_date)
        .bind(body.end_date)
        .bind(body.budget)
        .fetch_one(pool)
        .await?;

        Self::get_row(pool, id).await?.ok_or(sqlx::Error::RowNotFound)
    }

    /// Applies a partial update and returns the stored row, or `None` when
    /// the id does not exist.
    pub async fn update(
        pool: &SqlitePool,
        id: i64,
        body: UpdateEvent,
    ) -> Result<Option<Event>, sqlx::Error> {
        let Some(current) = Self::get_row(pool, id).await? else {
            return Ok(None);
        };

        let name = body.name.unwrap_or(current.name);
        let location = body.location.apply(current.location);
        let forecast = body.forecast.apply(current.forecast);
        let start_date = body.start_date.unwrap_or(current.start_date);
        let end_date = body.end_date.unwrap_or(current.end_date);
        let budget = body.budget.apply(current.budget);

        sqlx::query(
            "UPDATE events SET name = ?, location = ?, forecast = ?, start_date = ?, \
             end_date = ?, budget = ? WHERE id = ?",
        )
        .bind(&name)
        .bind(&location)
        .bind(&forecast)
        .bind(start_date)
        .bind(end_date)
        .bind(budget)
        .bind(id)
        .execute(pool)
        .await?;

        Self::get_row(pool, id).await
    }

    /// Deletes an event under the given policy.
    ///
    /// `restrict` refuses while artists or resources still reference the
    /// event; `cascade` removes them and the event in one transaction.
    pub async fn delete(
        pool: &SqlitePool,
        id: i64,
        policy: DeletePolicy,
    ) -> Result<EventDeleteOutcome, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let exists: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM events WHERE id = ?")
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;
        if exists == 0 {
            return Ok(EventDeleteOutcome::NotFound);
        }

        let dependents: i64 = sqlx::query_scalar(
            "SELECT (SELECT COUNT(*) FROM artists WHERE event_id = ?) \
             + (SELECT COUNT(*) FROM resources WHERE event_id = ?)",
        )
        .bind(id)
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        if dependents > 0 {
            match policy {
                DeletePolicy::Restrict => return Ok(EventDeleteOutcome::HasDependents),
                DeletePolicy::Cascade => {
                    sqlx::query("DELETE FROM artists WHERE event_id = ?")
                        .bind(id)
                        .execute(&mut *tx)
                        .await?;
                    sqlx::query("DELETE FROM resources WHERE event_id = ?")
                        .bind(id)
                        .execute(&mut *tx)
                        .await?;
                }
            }
        }

        sqlx::query("DELETE FROM events WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(EventDeleteOutcome::Deleted)
    }
}

// ============================================================================
// Artists
// ============================================================================

/// Queries for the `artists` table.
pub struct ArtistRepository;

impl ArtistRepository {
    /// Lists every artist together with its parent event.
    pub async fn list(pool: &SqlitePool) -> Result<Vec<ArtistWithEvent>, sqlx::Error> {
        let artists = sqlx::query_as::<_, Artist>("SELECT * FROM artists ORDER BY id")
            .fetch_all(pool)
            .await?;

        let mut loaded = Vec::with_capacity(artists.len());
        for artist in artists {
            let event = parent_event(pool, artist.event_id).await?;
            loaded.push(ArtistWithEvent { artist, event });
        }

        Ok(loaded)
    }

    /// Fetches one artist together with its parent event.
    pub async fn get(
        pool: &SqlitePool,
        id: i64,
    ) -> Result<Option<ArtistWithEvent>, sqlx::Error> {
        let Some(artist) = Self::get_row(pool, id).await? else {
            return Ok(None);
        };

        let event = parent_event(pool, artist.event_id).await?;
        Ok(Some(ArtistWithEvent { artist, event }))
    }

    /// Fetches one artist row without relations.
    pub async fn get_row(pool: &SqlitePool, id: i64) -> Result<Option<Artist>, sqlx::Error> {
        sqlx::query_as::<_, Artist>("SELECT * FROM artists WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Lists the artists booked for one event.
    pub async fn list_for_event(
        pool: &SqlitePool,
        event_id: i64,
    ) -> Result<Vec<Artist>, sqlx::Error> {
        sqlx::query_as::<_, Artist>("SELECT * FROM artists WHERE event_id = ? ORDER BY id")
            .bind(event_id)
            .fetch_all(pool)
            .await
    }

    /// Inserts a new artist and returns the stored row.
    ///
    /// A nonexistent `event_id` fails the foreign-key constraint.
    pub async fn create(pool: &SqlitePool, body: CreateArtist) -> Result<Artist, sqlx::Error> {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO artists (name, surname, genre, contact_info, available_date, event_id) \
             VALUES (?, ?, ?, ?, ?, ?) RETURNING id",
        )
        .bind(&body.name)
        .bind(&body.surname)
        .bind(&body.genre)
        .bind(&body.contact_info)
        .bind(&body.available_date)
        .bind(body.event_id)
        .fetch_one(pool)
        .await?;

        Self::get_row(pool, id).await?.ok_or(sqlx::Error::RowNotFound)
    }

    /// Applies a partial update and returns the stored row, or `None` when
    /// the id does not exist.
    pub async fn update(
        pool: &SqlitePool,
        id: i64,
        body: UpdateArtist,
    ) -> Result<Option<Artist>, sqlx::Error> {
        let Some(current) = Self::get_row(pool, id).await? else {
            return Ok(None);
        };

        let name = body.name.unwrap_or(current.name);
        let surname = body.surname.apply(current.surname);
        let genre = body.genre.apply(current.genre);
        let contact_info = body.contact_info.apply(current.contact_info);
        let available_date = body.available_date.apply(current.available_date);
        let event_id = body.event_id.unwrap_or(current.event_id);

        sqlx::query(
            "UPDATE artists SET name = ?, surname = ?, genre = ?, contact_info = ?, \
             available_date = ?, event_id = ? WHERE id = ?",
        )
        .bind(&name)
        .bind(&surname)
        .bind(&genre)
        .bind(&contact_info)
        .bind(&available_date)
        .bind(event_id)
        .bind(id)
        .execute(pool)
        .await?;

        Self::get_row(pool, id).await
    }

    /// Deletes an artist by id. Returns `false` when the id does not exist.
    pub async fn delete(pool: &SqlitePool, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM artists WHERE id = ?")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

// ============================================================================
// Resources
// ============================================================================

/// Queries for the `resources` table.
pub struct ResourceRepository;

impl ResourceRepository {
    /// Lists every resource together with its parent event.
    pub async fn list(pool: &SqlitePool) -> Result<Vec<ResourceWithEvent>, sqlx::Error> {
        let resources = sqlx::query_as::<_, Resource>("SELECT * FROM resources ORDER BY id")
            .fetch_all(pool)
            .await?;

        let mut loaded = Vec::with_capacity(resources.len());
        for resource in resources {
            let event = parent_event(pool, resource.event_id).await?;
            loaded.push(ResourceWithEvent { resource, event });
        }

        Ok(loaded)
    }

    /// Fetches one resource together with its parent event.
    pub async fn get(
        pool: &SqlitePool,
        id: i64,
    ) -> Result<Option<ResourceWithEvent>, sqlx::Error> {
        let Some(resource) = Self::get_row(pool, id).await? else {
            return Ok(None);
        };

        let event = parent_event(pool, resource.event_id).await?;
        Ok(Some(ResourceWithEvent { resource, event }))
    }

    /// Fetches one resource row without relations.
    pub async fn get_row(pool: &SqlitePool, id: i64) -> Result<Option<Resource>, sqlx::Error> {
        sqlx::query_as::<_, Resource>("SELECT * FROM resources WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Lists the resources rented for one event.
    pub async fn list_for_event(
        pool: &SqlitePool,
        event_id: i64,
    ) -> Result<Vec<Resource>, sqlx::Error> {
        sqlx::query_as::<_, Resource>("SELECT * FROM resources WHERE event_id = ? ORDER BY id")
            .bind(event_id)
            .fetch_all(pool)
            .await
    }

    /// Inserts a new resource and returns the stored row.
    ///
    /// A nonexistent `event_id` fails the foreign-key constraint.
    pub async fn create(pool: &SqlitePool, body: CreateResource) -> Result<Resource, sqlx::Error> {
        Self::insert(pool, &body.name, body.rented, body.quantity, body.event_id).await
    }

    /// Inserts a resource under an event, taking the parent id from the path.
    pub async fn create_for_event(
        pool: &SqlitePool,
        event_id: i64,
        body: CreateEventResource,
    ) -> Result<Resource, sqlx::Error> {
        Self::insert(pool, &body.name, body.rented, body.quantity, event_id).await
    }

    async fn insert(
        pool: &SqlitePool,
        name: &str,
        rented: bool,
        quantity: Option<i64>,
        event_id: i64,
    ) -> Result<Resource, sqlx::Error> {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO resources (name, rented, quantity, event_id) \
             VALUES (?, ?, ?, ?) RETURNING id",
        )
        .bind(name)
        .bind(rented)
        .bind(quantity)
        .bind(event_id)
        .fetch_one(pool)
        .await?;

        Self::get_row(pool, id).await?.ok_or(sqlx::Error::RowNotFound)
    }

    /// Applies a partial update and returns the stored row, or `None` when
    /// the id does not exist.
    pub async fn update(
        pool: &SqlitePool,
        id: i64,
        body: UpdateResource,
    ) -> Result<Option<Resource>, sqlx::Error> {
        let Some(current) = Self::get_row(pool, id).await? else {
            return Ok(None);
        };

        let name = body.name.unwrap_or(current.name);
        let rented = body.rented.unwrap_or(current.rented);
        let quantity = body.quantity.apply(current.quantity);
        let event_id = body.event_id.unwrap_or(current.event_id);

        sqlx::query(
            "UPDATE resources SET name = ?, rented = ?, quantity = ?, event_id = ? WHERE id = ?",
        )
        .bind(&name)
        .bind(rented)
        .bind(quantity)
        .bind(event_id)
        .bind(id)
        .execute(pool)
        .await?;

        Self::get_row(pool, id).await
    }

    /// Deletes a resource by id. Returns `false` when the id does not exist.
    pub async fn delete(pool: &SqlitePool, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM resources WHERE id = ?")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Deletes a resource only when it belongs to the given event.
    ///
    /// Returns `false` both for a missing id and for a resource owned by a
    /// different event.
    pub async fn delete_for_event(
        pool: &SqlitePool,
        event_id: i64,
        resource_id: i64,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM resources WHERE id = ? AND event_id = ?")
            .bind(resource_id)
            .bind(event_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
