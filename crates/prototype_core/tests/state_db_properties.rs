//! # Object Store Verification
//!
//! End-to-end checks of the store's guarantees:
//!
//! 1. Fresh objects are valid and zeroed
//! 2. Destruction invalidates handles, including after id reuse
//! 3. Compaction preserves every survivor's data
//! 4. Capacity exhaustion is recoverable and leaves state intact
//!
//! Run with: cargo test -p prototype_core --test state_db_properties

use bytemuck::{Pod, Zeroable};
use prototype_core::{ObjectError, ObjectHandle, StateDb, StateKey, TypeId};

#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
#[repr(C)]
struct Pos {
    x: f32,
    y: f32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
#[repr(C)]
struct Tag {
    handle: u64,
    marker: u32,
    _pad: u32,
}

fn body_db(capacity: usize) -> (StateDb, TypeId, StateKey<Pos>) {
    let mut db = StateDb::new();
    let body = db.register_type("Body", capacity);
    let pos = db.register_state::<Pos>(body, "Pos");
    (db, body, pos)
}

#[test]
fn verify_body_scenario() {
    let (mut db, body, pos) = body_db(3);

    let a = db.create_object(body).unwrap();
    let b = db.create_object(body).unwrap();
    let c = db.create_object(body).unwrap();
    *db.state_mut(pos, a).unwrap() = Pos { x: 1.0, y: 1.0 };
    *db.state_mut(pos, b).unwrap() = Pos { x: 2.0, y: 2.0 };
    *db.state_mut(pos, c).unwrap() = Pos { x: 3.0, y: 3.0 };

    db.destroy_object(b).unwrap();

    let rows = db.full_state(pos);
    assert_eq!(rows.len(), 2);
    assert!(rows.contains(&Pos { x: 1.0, y: 1.0 }));
    assert!(rows.contains(&Pos { x: 3.0, y: 3.0 }));
    assert!(!db.is_object_handle_valid(b));

    let d = db.create_object(body).unwrap();
    assert_eq!(d.object_id(), b.object_id());
    assert_ne!(d.lifecycle(), b.lifecycle());
    assert_ne!(d.to_bits(), b.to_bits());
    assert!(!db.is_object_handle_valid(b));
    assert_eq!(db.state(pos, d), Some(&Pos::default()));
}

#[test]
fn verify_compaction_preserves_survivors() {
    const N: usize = 64;
    let mut db = StateDb::new();
    let body = db.register_type("Body", N);
    let pos = db.register_state::<Pos>(body, "Pos");
    let tag = db.register_state::<Tag>(body, "Tag");

    let handles: Vec<ObjectHandle> = (0..N).map(|_| db.create_object(body).unwrap()).collect();
    for (i, &h) in handles.iter().enumerate() {
        *db.state_mut(pos, h).unwrap() = Pos { x: i as f32, y: -(i as f32) };
        db.state_mut(tag, h).unwrap().marker = i as u32;
        db.state_mut(tag, h).unwrap().handle = h.to_bits();
    }

    let victim = N / 2;
    db.destroy_object(handles[victim]).unwrap();

    for (i, &h) in handles.iter().enumerate() {
        if i == victim {
            assert!(db.state(pos, h).is_none());
            continue;
        }
        assert_eq!(db.state(pos, h), Some(&Pos { x: i as f32, y: -(i as f32) }));
        assert_eq!(db.state(tag, h).unwrap().marker, i as u32);
    }

    assert_eq!(db.full_state(pos).len(), N - 1);
    assert_eq!(db.full_state(tag).len(), N - 1);

    // Rows stay aligned across states of the same type.
    for (p, t) in db.full_state(pos).iter().zip(db.full_state(tag)) {
        assert_eq!(p.x, t.marker as f32);
        let owner = db.handle_from_elem(pos, p).unwrap();
        assert_eq!(owner.to_bits(), t.handle);
    }
}

#[test]
fn verify_capacity_exhaustion_is_recoverable() {
    const K: usize = 5;
    let (mut db, body, pos) = body_db(K);

    let handles: Vec<_> = (0..K)
        .map(|i| {
            let (h, row) = db.create(pos).unwrap();
            row.x = i as f32;
            h
        })
        .collect();

    let err = db.create_object(body).unwrap_err();
    assert!(matches!(err, ObjectError::CapacityExhausted { capacity: K, .. }));
    assert_eq!(db.object_count(body), K);
    for (i, &h) in handles.iter().enumerate() {
        assert_eq!(db.state(pos, h).unwrap().x, i as f32);
    }

    db.destroy_object(handles[0]).unwrap();
    assert!(db.create_object(body).is_ok());
}

#[test]
fn verify_stale_handles_never_revalidate_under_churn() {
    let (mut db, body, pos) = body_db(8);
    let mut live: Vec<ObjectHandle> = Vec::new();
    let mut dead: Vec<ObjectHandle> = Vec::new();

    for round in 0..200u32 {
        if live.len() < 8 && round % 3 != 2 {
            let (h, row) = db.create(pos).unwrap();
            row.x = round as f32;
            live.push(h);
        } else if !live.is_empty() {
            let victim = live.swap_remove((round as usize * 7) % live.len());
            db.destroy_object(victim).unwrap();
            dead.push(victim);
        }

        assert_eq!(db.full_state(pos).len(), live.len());
        assert!(live.iter().all(|&h| db.is_object_handle_valid(h)));
        assert!(dead.iter().all(|&h| !db.is_object_handle_valid(h)));
    }
}

#[test]
fn verify_destroy_rejects_garbage() {
    let (mut db, body, _) = body_db(2);
    let h = db.create_object(body).unwrap();

    let wrong_lifecycle = ObjectHandle::compose(body, h.lifecycle().wrapping_add(2), h.object_id());
    let out_of_range = ObjectHandle::compose(body, h.lifecycle(), 3);
    let zero_id = ObjectHandle::compose(body, 0, 0);
    for garbage in [ObjectHandle::NULL, wrong_lifecycle, out_of_range, zero_id] {
        assert_eq!(db.destroy_object(garbage), Err(ObjectError::StaleHandle(garbage)));
    }
    assert!(db.is_object_handle_valid(h));
    assert_eq!(db.object_count(body), 1);
}
