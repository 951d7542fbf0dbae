use std::sync::Arc;

use super::authorization::EventScope;
use super::pagination::{Page, PageRequest};
use crate::error::Result;
use crate::middleware::AuthUser;
use crate::models::EventDetails;
use crate::repository::EventRepository;

/// Paginated, owner-scoped event listing.
#[derive(Clone)]
pub struct EventListing {
    repo: Arc<dyn EventRepository>,
}

impl EventListing {
    pub fn new(repo: Arc<dyn EventRepository>) -> Self {
        Self { repo }
    }

    pub async fn list_events(&self, actor: &AuthUser, request: PageRequest) -> Result<Page<EventDetails>> {
        let scope = EventScope::for_actor(actor);

        let (data, total) = futures::try_join!(
            self.repo.list_events(&scope, request.skip(), request.limit),
            self.repo.count_events(&scope),
        )?;

        Ok(Page {
            data,
            current_page: request.page,
            total_pages: request.total_pages(total),
            total_events: total,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Event, EventType, Location, ProposedDates, Role, User};
    use crate::repository::MemoryRepository;
    use chrono::{Duration, TimeZone, Utc};

    async fn seeded(events_for_first: usize, events_for_second: usize) -> (EventListing, AuthUser, AuthUser, AuthUser) {
        let repo = Arc::new(MemoryRepository::new());
        let first = User::new("hr_acme", "x".into(), Role::Requester, "Acme Corporation");
        let second = User::new("hr_globex", "x".into(), Role::Requester, "Globex Industries");
        let vendor = User::new("vendor_fitlife", "x".into(), Role::Provider, "FitLife Wellness");
        for user in [&first, &second, &vendor] {
            repo.insert_user(user).await.unwrap();
        }
        let event_type = EventType::new("Fitness Workshop - Yoga", "", vendor.id);
        repo.insert_event_type(&event_type).await.unwrap();

        let day = Utc.with_ymd_and_hms(2030, 5, 1, 9, 0, 0).unwrap();
        let created = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let owners = std::iter::repeat(&first)
            .take(events_for_first)
            .chain(std::iter::repeat(&second).take(events_for_second));
        for (i, owner) in owners.enumerate() {
            let event = Event::new_pending(
                &event_type,
                owner.id,
                &owner.company_name,
                ProposedDates::new(vec![day, day + Duration::days(1), day + Duration::days(2)]).unwrap(),
                Location::new(Some("50000"), None).unwrap(),
                created + Duration::minutes(i as i64),
            );
            repo.insert_event(&event).await.unwrap();
        }

        (EventListing::new(repo), first.into(), second.into(), vendor.into())
    }

    #[tokio::test]
    async fn twenty_three_records_paginate_into_three_pages() {
        let (listing, hr, _, _) = seeded(23, 0).await;

        let first = listing.list_events(&hr, PageRequest::new(Some(1), Some(10))).await.unwrap();
        assert_eq!(first.data.len(), 10);
        assert_eq!(first.total_pages, 3);
        assert_eq!(first.total_events, 23);
        assert!(first.data.windows(2).all(|w| w[0].created_at >= w[1].created_at));

        let last = listing.list_events(&hr, PageRequest::new(Some(3), Some(10))).await.unwrap();
        assert_eq!(last.data.len(), 3);

        let beyond = listing.list_events(&hr, PageRequest::new(Some(4), Some(10))).await.unwrap();
        assert!(beyond.data.is_empty());
        assert_eq!(beyond.total_pages, 3);
        assert_eq!(beyond.current_page, 4);
    }

    #[tokio::test]
    async fn never_leaks_other_parties_events() {
        let (listing, first, second, vendor) = seeded(4, 2).await;

        let page = listing.list_events(&second, PageRequest::default()).await.unwrap();
        assert_eq!(page.total_events, 2);
        assert!(page.data.iter().all(|e| e.requester.id == second.id));

        let page = listing.list_events(&first, PageRequest::default()).await.unwrap();
        assert!(page.data.iter().all(|e| e.requester.id == first.id));

        let page = listing.list_events(&vendor, PageRequest::default()).await.unwrap();
        assert_eq!(page.total_events, 6);
        assert!(page.data.iter().all(|e| e.provider.id == vendor.id));
    }

    #[tokio::test]
    async fn empty_listing_has_zero_pages() {
        let (listing, hr, _, _) = seeded(0, 0).await;
        let page = listing.list_events(&hr, PageRequest::default()).await.unwrap();
        assert_eq!(page.total_pages, 0);
        assert_eq!(page.current_page, 1);
    }
}
