//! Connection and shared-film queries through `ConnectionService`

mod common;

use castlink::{Connection, ConnectionService, FilmId, IngestError, PersonId, StoreError};
use common::{test_config, FakeCatalog, Fixture};

fn service(fixture: &Fixture) -> ConnectionService {
    ConnectionService::new(fixture.store.clone(), fixture.dyn_catalog(), test_config()).unwrap()
}

/// A(1) appears in film 1 (2020) and film 2 (2022); B(2) only in film 2
fn two_film_world() -> FakeCatalog {
    FakeCatalog::new()
        .actor(1, "Ada")
        .actor(2, "Bo")
        .film(1, "2020-01-01", 6.5, &[(1, 0), (7, 1)])
        .film(2, "2022-01-01", 7.0, &[(1, 0), (2, 1)])
}

#[test]
fn test_direct_costars_are_one_hop_apart() {
    let fixture = Fixture::new(two_film_world());
    let mut service = service(&fixture);

    let connection = service.find_connection(PersonId(1), PersonId(2)).unwrap();

    match &connection {
        Connection::Path(hops) => {
            assert_eq!(hops.len(), 1);
            assert_eq!(hops[0].from, PersonId(1));
            assert_eq!(hops[0].to, PersonId(2));
            assert_eq!(hops[0].via.film_id, FilmId(2));
            assert_eq!(hops[0].via.title, "Film 2");
        }
        other => panic!("expected a path, got {:?}", other),
    }
    assert_eq!(connection.degrees(), Some(1));

    let shared = service.shared_film(PersonId(1), PersonId(2)).unwrap().unwrap();
    assert_eq!(shared.id, FilmId(2));
}

#[test]
fn test_path_reversed_query_has_same_length() {
    let fixture = Fixture::new(two_film_world());
    let mut service = service(&fixture);

    let forward = service.find_connection(PersonId(1), PersonId(7)).unwrap();
    let backward = service.find_connection(PersonId(7), PersonId(1)).unwrap();

    assert_eq!(forward.degrees(), Some(1));
    assert_eq!(backward.degrees(), Some(1));
    if let Connection::Path(hops) = backward {
        assert_eq!(hops[0].from, PersonId(7));
        assert_eq!(hops[0].via.film_id, FilmId(1));
    }
}

#[test]
fn test_two_hops_through_uningested_costar() {
    // C(3) links A and B but is never ingested directly
    let catalog = FakeCatalog::new()
        .film(1, "2011-01-01", 5.0, &[(1, 0), (3, 1)])
        .film(2, "2012-01-01", 5.0, &[(2, 0), (3, 1)]);
    let fixture = Fixture::new(catalog);
    let mut service = service(&fixture);

    let connection = service.find_connection(PersonId(1), PersonId(2)).unwrap();

    let Connection::Path(hops) = connection else {
        panic!("expected a path");
    };
    assert_eq!(hops.len(), 2);
    assert_eq!(hops[0].from, PersonId(1));
    assert_eq!(hops[0].to, PersonId(3));
    assert_eq!(hops[1].from, PersonId(3));
    assert_eq!(hops[1].to, PersonId(2));
    assert!(!fixture.store.get_person(PersonId(3)).unwrap().unwrap().fully_expanded);
}

#[test]
fn test_same_person_is_zero_degrees() {
    let fixture = Fixture::new(two_film_world());
    let mut service = service(&fixture);

    let connection = service.find_connection(PersonId(1), PersonId(1)).unwrap();

    assert_eq!(connection, Connection::Same);
    assert_eq!(connection.degrees(), Some(0));
}

#[test]
fn test_same_person_unknown_still_fails() {
    let fixture = Fixture::new(two_film_world());
    let mut service = service(&fixture);

    let err = service.find_connection(PersonId(404), PersonId(404)).unwrap_err();

    let ingest = err.downcast_ref::<IngestError>().unwrap();
    assert!(ingest.is_not_found());
}

#[test]
fn test_shared_film_with_self_makes_no_calls() {
    let fixture = Fixture::new(two_film_world());
    let mut service = service(&fixture);

    assert!(service.shared_film(PersonId(1), PersonId(1)).unwrap().is_none());
    assert_eq!(fixture.catalog.total_calls(), 0);
    assert!(fixture.store.get_person(PersonId(1)).unwrap().is_none());
}

#[test]
fn test_shared_film_prefers_highest_rating() {
    let catalog = FakeCatalog::new()
        .film(1, "2024-01-01", 5.0, &[(1, 0), (2, 0)])
        .film(2, "2001-01-01", 9.1, &[(1, 0), (2, 0)])
        .film(3, "2010-01-01", 7.0, &[(1, 0), (2, 0)]);
    let fixture = Fixture::new(catalog);
    let mut service = service(&fixture);

    let film = service.shared_film(PersonId(1), PersonId(2)).unwrap().unwrap();
    assert_eq!(film.id, FilmId(2));

    // The edge, by contrast, is the most recent shared film
    let connection = service.find_connection(PersonId(1), PersonId(2)).unwrap();
    let Connection::Path(hops) = connection else {
        panic!("expected a path");
    };
    assert_eq!(hops[0].via.film_id, FilmId(1));
}

#[test]
fn test_shared_film_none_when_no_common_film() {
    let catalog = FakeCatalog::new()
        .film(1, "2020-01-01", 5.0, &[(1, 0), (3, 0)])
        .film(2, "2020-01-01", 5.0, &[(2, 0), (3, 0)]);
    let fixture = Fixture::new(catalog);
    let mut service = service(&fixture);

    assert!(service.shared_film(PersonId(1), PersonId(2)).unwrap().is_none());
}

#[test]
fn test_disjoint_people_are_not_connected() {
    let catalog = FakeCatalog::new()
        .film(1, "2020-01-01", 5.0, &[(1, 0), (3, 0)])
        .film(2, "2020-01-01", 5.0, &[(2, 0), (4, 0)]);
    let fixture = Fixture::new(catalog);
    let mut service = service(&fixture);

    let connection = service.find_connection(PersonId(1), PersonId(2)).unwrap();

    assert_eq!(connection, Connection::NotConnected);
    assert_eq!(connection.degrees(), None);
}

#[test]
fn test_new_ingestion_invalidates_loaded_graph() {
    // A(1)-C(3) in film 1, B(2)-D(4) in film 2, C-D in film 3
    let catalog = FakeCatalog::new()
        .film(1, "2015-01-01", 5.0, &[(1, 0), (3, 0)])
        .film(2, "2016-01-01", 5.0, &[(2, 0), (4, 0)])
        .film(3, "2017-01-01", 5.0, &[(3, 0), (4, 0)]);
    let fixture = Fixture::new(catalog);
    let mut service = service(&fixture);

    // Film 3 is not stored yet, so C and D look like dead ends
    let before = service.find_connection(PersonId(1), PersonId(2)).unwrap();
    assert_eq!(before, Connection::NotConnected);

    let report = service.ingest(PersonId(3)).unwrap();
    assert!(report.changed_store());
    assert_eq!(report.films_created, 1);

    let after = service.find_connection(PersonId(1), PersonId(2)).unwrap();
    let Connection::Path(hops) = after else {
        panic!("expected a path after ingesting the bridge");
    };
    let chain: Vec<PersonId> = std::iter::once(hops[0].from)
        .chain(hops.iter().map(|hop| hop.to))
        .collect();
    assert_eq!(chain, vec![PersonId(1), PersonId(3), PersonId(4), PersonId(2)]);
    assert_eq!(hops[1].via.film_id, FilmId(3));
}

#[test]
fn test_store_failure_during_search_is_tagged() {
    let fixture = Fixture::new(two_film_world());
    let mut service = service(&fixture);
    service.ingest(PersonId(1)).unwrap();
    service.ingest(PersonId(2)).unwrap();

    // Both people are cache hits; only the neighbour query touches the missing table
    fixture
        .store
        .connect()
        .unwrap()
        .execute_batch("DROP TABLE appearances")
        .unwrap();

    let err = service.find_connection(PersonId(1), PersonId(2)).unwrap_err();
    assert!(err.downcast_ref::<StoreError>().is_some(), "{:#}", err);
    assert!(err.downcast_ref::<IngestError>().is_none());

    let err = service.shared_film(PersonId(1), PersonId(2)).unwrap_err();
    assert!(err.downcast_ref::<StoreError>().is_some(), "{:#}", err);
}

#[test]
fn test_search_people_filters_performers() {
    let catalog = FakeCatalog::new()
        .actor(10, "Sam Lee")
        .actor(20, "Sam Wu")
        .director(30, "Sam Director");
    let fixture = Fixture::new(catalog);
    let service = service(&fixture);

    let found: Vec<PersonId> = service
        .search_people("sam")
        .unwrap()
        .into_iter()
        .map(|person| person.id)
        .collect();

    assert_eq!(found, vec![PersonId(20), PersonId(10)]);
}
