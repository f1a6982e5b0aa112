use crate::models::{
    AnnouncementPayload, AttendancePayload, ChildPayload, MessagePayload, ObservationPayload,
};

use super::QueryCache;

/// Server-side resources a mutation can touch. Each maps to the query
/// families `QueryCache::invalidate` stales on success.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Children,
    Attendance,
    Observations,
    Messages,
    Announcements,
}

/// One write operation against the API, carrying its payload
#[derive(Debug, Clone)]
pub enum Mutation {
    CreateChild(ChildPayload),
    UpdateChild { id: String, payload: ChildPayload },
    DeleteChild { id: String },
    MarkAttendance(AttendancePayload),
    UpdateAttendance { id: String, payload: AttendancePayload },
    CreateObservation(ObservationPayload),
    UpdateObservation { id: String, payload: ObservationPayload },
    DeleteObservation { id: String },
    SendMessage(MessagePayload),
    SendAnnouncement(AnnouncementPayload),
}

impl Mutation {
    pub fn resource(&self) -> Resource {
        match self {
            Mutation::CreateChild(_) | Mutation::UpdateChild { .. } | Mutation::DeleteChild { .. } => {
                Resource::Children
            }
            Mutation::MarkAttendance(_) | Mutation::UpdateAttendance { .. } => Resource::Attendance,
            Mutation::CreateObservation(_)
            | Mutation::UpdateObservation { .. }
            | Mutation::DeleteObservation { .. } => Resource::Observations,
            Mutation::SendMessage(_) => Resource::Messages,
            Mutation::SendAnnouncement(_) => Resource::Announcements,
        }
    }

    /// Past-tense label for success notices
    pub fn describe(&self) -> &'static str {
        match self {
            Mutation::CreateChild(_) => "Child registered",
            Mutation::UpdateChild { .. } => "Child updated",
            Mutation::DeleteChild { .. } => "Child removed",
            Mutation::MarkAttendance(_) => "Attendance recorded",
            Mutation::UpdateAttendance { .. } => "Attendance updated",
            Mutation::CreateObservation(_) => "Observation recorded",
            Mutation::UpdateObservation { .. } => "Observation updated",
            Mutation::DeleteObservation { .. } => "Observation removed",
            Mutation::SendMessage(_) => "Message sent",
            Mutation::SendAnnouncement(_) => "Announcement sent",
        }
    }
}

/// Runs at most one mutation at a time. The pending flag is the only
/// concurrency guard: while set, submit handlers refuse to start another
/// mutation. On settlement a successful mutation invalidates its
/// resource's query families; a failed one invalidates nothing.
#[derive(Debug, Default)]
pub struct MutationRunner {
    pending: bool,
}

impl MutationRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the single mutation slot. Returns false if one is already
    /// in flight, in which case the caller must not issue the request.
    pub fn try_begin(&mut self) -> bool {
        if self.pending {
            return false;
        }
        self.pending = true;
        true
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Record the mutation's outcome and release the slot
    pub fn settle(&mut self, cache: &mut QueryCache, resource: Resource, success: bool) {
        self.pending = false;
        if success {
            cache.invalidate(resource);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::FetchDecision;

    #[test]
    fn test_single_mutation_slot() {
        let mut runner = MutationRunner::new();
        assert!(runner.try_begin());
        assert!(runner.is_pending());
        // A second submit while one is in flight is refused
        assert!(!runner.try_begin());

        let mut cache = QueryCache::new();
        runner.settle(&mut cache, Resource::Messages, true);
        assert!(!runner.is_pending());
        assert!(runner.try_begin());
    }

    #[test]
    fn test_success_invalidates_owning_resource() {
        let mut cache = QueryCache::new();
        let FetchDecision::Begin(generation) = cache.attendance_by_child.begin_fetch("c1".into())
        else {
            unreachable!()
        };
        cache
            .attendance_by_child
            .resolve(&"c1".to_string(), generation, Ok(vec![]));

        let mut runner = MutationRunner::new();
        runner.try_begin();
        runner.settle(&mut cache, Resource::Attendance, true);

        assert!(matches!(
            cache.attendance_by_child.begin_fetch("c1".into()),
            FetchDecision::Begin(_)
        ));
    }

    #[test]
    fn test_failure_invalidates_nothing() {
        let mut cache = QueryCache::new();
        let FetchDecision::Begin(generation) = cache.children.begin_fetch(()) else {
            unreachable!()
        };
        cache.children.resolve(&(), generation, Ok(vec![]));

        let mut runner = MutationRunner::new();
        runner.try_begin();
        runner.settle(&mut cache, Resource::Children, false);

        // Cached data still fresh; the user retries explicitly
        assert!(!runner.is_pending());
        assert_eq!(cache.children.begin_fetch(()), FetchDecision::Fresh);
    }

    #[test]
    fn test_mutation_resource_mapping() {
        let payload = MessagePayload {
            recipient_id: "u2".into(),
            subject: "hi".into(),
            content: "hello".into(),
            parent_id: None,
        };
        assert_eq!(Mutation::SendMessage(payload).resource(), Resource::Messages);
        assert_eq!(
            Mutation::DeleteChild { id: "c1".into() }.resource(),
            Resource::Children
        );
    }
}
