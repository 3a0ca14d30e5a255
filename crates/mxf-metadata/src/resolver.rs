//! Two-stage reference resolver (spec §4.6, §9 "reference multimap ->
//! two-stage resolver").
//!
//! No direct teacher analogue exists — EXIF has no cross-object reference
//! graph — so this module is structured directly from the source's own
//! design note: an append-only queue of deferred `(UUID, referrer, slot)`
//! links plus a `UUID -> object` map populated as InstanceUIDs are
//! observed, with no single structure holding both.

use std::collections::HashMap;

use mxf_core::Uuid;

use crate::Error;

/// Index into a partition's metadata object arena. Opaque to this crate;
/// the partition layer defines what it actually indexes.
pub type ObjectId = usize;

/// Which reference kind a deferred link is (spec §4.6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefKind {
    Strong,
    Weak,
}

/// A reference that named a UUID not yet seen as an InstanceUID.
#[derive(Debug, Clone, Copy)]
struct UnmatchedRef {
    target: Uuid,
    referrer: ObjectId,
    kind: RefKind,
}

/// Resolves strong/weak reference UUIDs to object ids across a single
/// partition's parse (spec §4.6).
#[derive(Debug, Default)]
pub struct ReferenceResolver {
    targets: HashMap<Uuid, ObjectId>,
    unmatched: Vec<UnmatchedRef>,
}

/// A dangling weak reference, surfaced as a warning rather than an error
/// (spec §7 `DanglingWeakRef`).
#[derive(Debug, Clone, Copy)]
pub struct DanglingWeakRef {
    pub target: Uuid,
    pub referrer: ObjectId,
}

impl ReferenceResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `object_id`'s InstanceUID, draining any references that
    /// were waiting on it (spec §4.6 "InstanceUID handling").
    ///
    /// Returns the set of `(referrer, kind)` pairs that resolved to this
    /// object, in case the caller needs to link slots immediately.
    pub fn register_instance(&mut self, uuid: Uuid, object_id: ObjectId) -> Vec<(ObjectId, RefKind)> {
        self.targets.insert(uuid, object_id);
        self.drain_matching(uuid)
    }

    fn drain_matching(&mut self, uuid: Uuid) -> Vec<(ObjectId, RefKind)> {
        let mut resolved = Vec::new();
        self.unmatched.retain(|r| {
            if r.target == uuid {
                resolved.push((r.referrer, r.kind));
                false
            } else {
                true
            }
        });
        resolved
    }

    /// Register a strong or weak reference from `referrer` to `target`
    /// (spec §4.6 "Reference registration"). Returns `Some(object_id)`
    /// immediately if the target was already known, otherwise queues the
    /// reference and returns `None`.
    pub fn register_reference(&mut self, referrer: ObjectId, target: Uuid, kind: RefKind) -> Option<ObjectId> {
        if let Some(&id) = self.targets.get(&target) {
            return Some(id);
        }
        self.unmatched.push(UnmatchedRef { target, referrer, kind });
        None
    }

    /// Drain everything still unresolved at the end of a partition parse
    /// (spec §4.6 "Two-phase finalisation"). Strong refs become hard
    /// errors; weak refs are returned for the caller to log as warnings.
    pub fn finalize(mut self) -> (Vec<DanglingWeakRef>, Result<(), Error>) {
        let mut dangling_weak = Vec::new();
        let mut strong_error = Ok(());

        for r in self.unmatched.drain(..) {
            match r.kind {
                RefKind::Weak => dangling_weak.push(DanglingWeakRef { target: r.target, referrer: r.referrer }),
                RefKind::Strong => {
                    if strong_error.is_ok() {
                        strong_error = Err(Error::DanglingStrongRef(r.target));
                    }
                }
            }
        }

        (dangling_weak, strong_error)
    }

    pub fn is_known(&self, uuid: &Uuid) -> bool {
        self.targets.contains_key(uuid)
    }
}
