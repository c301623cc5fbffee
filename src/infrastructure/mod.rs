mod heartbeat;
mod task_manager;
mod timer;

pub use heartbeat::HeartbeatMonitor;
pub use task_manager::TaskManager;
pub use timer::ReconnectTimer;
