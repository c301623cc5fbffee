use tokio::task::JoinHandle;

/// Tracks the client's background tasks (the socket read task) so a
/// deliberate close can abort them all.
pub struct TaskManager {
    handles: Vec<JoinHandle<()>>,
}

impl TaskManager {
    pub fn new() -> Self {
        Self {
            handles: Vec::new(),
        }
    }

    /// Spawn a task and track it
    pub fn spawn<F>(&mut self, future: F)
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        self.handles.push(tokio::spawn(future));
        // Finished tasks keep their slot until the next abort; bound the list.
        self.handles.retain(|handle| !handle.is_finished());
    }

    /// Abort all tasks without waiting
    pub fn abort_all(&mut self) {
        for handle in &self.handles {
            handle.abort();
        }
        self.handles.clear();
    }
}

impl Default for TaskManager {
    fn default() -> Self {
        Self::new()
    }
}
