use std::collections::VecDeque;

/// FIFO waiting list of vehicle identifiers for a single charging point.
///
/// The queue manager owning it is expected to keep it behind a lock; none of
/// the operations here block or look at anything but the list itself.
#[derive(Debug, Clone, Default)]
pub struct WaitingQueue {
    vehicles: VecDeque<String>,
}

impl WaitingQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the current list, head first.
    pub fn snapshot(&self) -> Vec<String> {
        self.vehicles.iter().cloned().collect()
    }

    /// Appends the vehicle and returns its 1-based position.
    ///
    /// Duplicates are accepted: keeping a vehicle from queueing twice is the
    /// coordinator's job.
    pub fn enqueue(&mut self, vehicle_id: impl Into<String>) -> usize {
        self.vehicles.push_back(vehicle_id.into());
        self.vehicles.len()
    }

    pub fn has_priority(&self, vehicle_id: &str) -> bool {
        self.vehicles.front().is_some_and(|head| head == vehicle_id)
    }

    /// Removes the head if it is `vehicle_id`, ignoring surrounding whitespace
    /// on both sides. Anything else leaves the list untouched.
    pub fn release(&mut self, vehicle_id: &str) -> bool {
        let is_head = self
            .vehicles
            .front()
            .is_some_and(|head| head.trim() == vehicle_id.trim());
        if is_head {
            self.vehicles.pop_front();
        }
        is_head
    }

    pub fn contains(&self, vehicle_id: &str) -> bool {
        self.vehicles.iter().any(|queued| queued == vehicle_id)
    }

    pub fn head(&self) -> Option<&str> {
        self.vehicles.front().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.vehicles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vehicles.is_empty()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn queue_of(vehicles: &[&str]) -> WaitingQueue {
        let mut queue = WaitingQueue::new();
        for vehicle in vehicles {
            queue.enqueue(*vehicle);
        }
        queue
    }

    #[test]
    fn test_enqueue_keeps_fifo_order() {
        let mut queue = WaitingQueue::new();
        assert_eq!(queue.enqueue("car-1"), 1);
        assert_eq!(queue.enqueue("car-2"), 2);
        assert_eq!(queue.enqueue("car-3"), 3);
        assert_eq!(queue.snapshot(), vec!["car-1", "car-2", "car-3"]);
    }

    #[test]
    fn test_enqueue_accepts_duplicates() {
        let mut queue = queue_of(&["car-1"]);
        assert_eq!(queue.enqueue("car-1"), 2);
        assert_eq!(queue.snapshot(), vec!["car-1", "car-1"]);
    }

    #[test]
    fn test_snapshot_is_detached() {
        let mut queue = queue_of(&["car-1"]);
        let snapshot = queue.snapshot();
        queue.enqueue("car-2");
        assert_eq!(snapshot, vec!["car-1"]);
    }

    #[test]
    fn test_priority() {
        let queue = WaitingQueue::new();
        assert!(!queue.has_priority("car-1"));

        let queue = queue_of(&["car-1", "car-2"]);
        assert!(queue.has_priority("car-1"));
        assert!(!queue.has_priority("car-2"));
        assert!(!queue.has_priority("car-9"));
    }

    #[test]
    fn test_release_head_only() {
        let mut queue = queue_of(&["car-1", "car-2", "car-3"]);

        // Not the head: nothing changes
        assert!(!queue.release("car-2"));
        assert_eq!(queue.snapshot(), vec!["car-1", "car-2", "car-3"]);

        assert!(queue.release("car-1"));
        assert_eq!(queue.head(), Some("car-2"));
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn test_release_trims_whitespace() {
        let mut queue = queue_of(&["car-1\n"]);
        assert!(queue.release("  car-1"));
        assert!(queue.is_empty());
    }

    #[test]
    fn test_release_on_empty_queue() {
        let mut queue = WaitingQueue::new();
        assert!(!queue.release("car-1"));
        assert!(queue.is_empty());
    }
}
