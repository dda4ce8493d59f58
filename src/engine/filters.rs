use crate::models::booking::{BookingFilters, FiltersPatch};
use crate::models::location::LockerLocation;

pub fn apply_filters(current: &BookingFilters, patch: FiltersPatch) -> BookingFilters {
    BookingFilters {
        locker_size: patch.locker_size.unwrap_or(current.locker_size),
        service_type: patch.service_type.unwrap_or(current.service_type),
        open_24_hours: patch.open_24_hours.unwrap_or(current.open_24_hours),
        available_now: patch.available_now.unwrap_or(current.available_now),
    }
}

impl BookingFilters {
    pub fn matches(&self, location: &LockerLocation) -> bool {
        let size_ok = self
            .locker_size
            .is_none_or(|size| location.offers(size));
        let hours_ok = !self.open_24_hours || location.is_open_24_hours;
        let availability_ok = !self.available_now || location.has_free_locker();

        size_ok && hours_ok && availability_ok
    }
}

/// Locations passing every filter predicate, in input order.
pub fn filter_locations(locations: &[LockerLocation], filters: &BookingFilters) -> Vec<LockerLocation> {
    locations
        .iter()
        .filter(|location| filters.matches(location))
        .cloned()
        .collect()
}

pub fn matches_query(location: &LockerLocation, query: &str) -> bool {
    let needle = query.trim().to_lowercase();
    needle.is_empty()
        || location.name.to_lowercase().contains(&needle)
        || location.address.to_lowercase().contains(&needle)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::{apply_filters, filter_locations, matches_query};
    use crate::models::booking::{BookingFilters, FiltersPatch, ServiceType};
    use crate::models::location::{LockerLocation, LockerSize, SizePricing};

    pub(crate) fn location(
        id: u64,
        available: u32,
        open_24h: bool,
        sizes: &[LockerSize],
    ) -> LockerLocation {
        LockerLocation {
            id,
            name: format!("Dulapuri {id}"),
            address: format!("Strada {id}, Bucuresti"),
            lat: 44.42 + id as f64 * 0.01,
            lng: 26.10,
            available_lockers: available,
            is_open_24_hours: open_24h,
            locker_sizes: sizes.to_vec(),
            pricing: Some(SizePricing {
                small: 4.99,
                medium: 7.99,
                large: 9.99,
            }),
            is_active: true,
        }
    }

    fn sample() -> Vec<LockerLocation> {
        vec![
            location(1, 8, true, &LockerSize::ALL),
            location(2, 0, false, &[LockerSize::Small, LockerSize::Medium]),
            location(3, 3, false, &[LockerSize::Large]),
            location(4, 2, true, &[LockerSize::Small]),
        ]
    }

    #[test]
    fn patch_only_touches_given_fields() {
        let current = BookingFilters {
            locker_size: Some(LockerSize::Small),
            service_type: ServiceType::Both,
            open_24_hours: true,
            available_now: false,
        };

        let next = apply_filters(
            &current,
            FiltersPatch {
                available_now: Some(true),
                ..FiltersPatch::default()
            },
        );

        assert_eq!(next.locker_size, Some(LockerSize::Small));
        assert_eq!(next.service_type, ServiceType::Both);
        assert!(next.open_24_hours);
        assert!(next.available_now);

        let cleared = apply_filters(
            &next,
            FiltersPatch {
                locker_size: Some(None),
                ..FiltersPatch::default()
            },
        );
        assert_eq!(cleared.locker_size, None);
    }

    #[test]
    fn default_filters_keep_every_location() {
        let locations = sample();
        let result = filter_locations(&locations, &BookingFilters::default());
        assert_eq!(result, locations);
    }

    #[test]
    fn predicates_combine_and_preserve_order() {
        let locations = sample();
        let filters = BookingFilters {
            locker_size: Some(LockerSize::Small),
            available_now: true,
            ..BookingFilters::default()
        };

        let ids: Vec<u64> = filter_locations(&locations, &filters)
            .iter()
            .map(|l| l.id)
            .collect();
        assert_eq!(ids, vec![1, 4]);

        let open_all_night = BookingFilters {
            open_24_hours: true,
            ..BookingFilters::default()
        };
        let ids: Vec<u64> = filter_locations(&locations, &open_all_night)
            .iter()
            .map(|l| l.id)
            .collect();
        assert_eq!(ids, vec![1, 4]);
    }

    #[test]
    fn every_combination_yields_an_ordered_subset() {
        let locations = sample();
        let sizes = [None, Some(LockerSize::Small), Some(LockerSize::Medium), Some(LockerSize::Large)];

        for locker_size in sizes {
            for open_24_hours in [false, true] {
                for available_now in [false, true] {
                    let filters = BookingFilters {
                        locker_size,
                        service_type: ServiceType::WashFold,
                        open_24_hours,
                        available_now,
                    };
                    let result = filter_locations(&locations, &filters);

                    let mut positions = result
                        .iter()
                        .map(|r| locations.iter().position(|l| l.id == r.id).unwrap());
                    let mut last = None;
                    for pos in positions.by_ref() {
                        assert!(last.is_none_or(|prev| prev < pos));
                        last = Some(pos);
                    }

                    for location in &result {
                        assert!(locker_size.is_none_or(|s| location.offers(s)));
                        assert!(!open_24_hours || location.is_open_24_hours);
                        assert!(!available_now || location.available_lockers > 0);
                    }
                }
            }
        }
    }

    #[test]
    fn query_matches_name_or_address_case_insensitively() {
        let loc = location(9, 1, false, &[LockerSize::Small]);
        assert!(matches_query(&loc, "dulapuri"));
        assert!(matches_query(&loc, "BUCURESTI"));
        assert!(matches_query(&loc, "  "));
        assert!(!matches_query(&loc, "cluj"));
    }
}
