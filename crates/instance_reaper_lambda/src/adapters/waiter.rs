use std::time::Duration;

/// Wall-clock delay seam so handler tests never sleep.
pub trait Waiter {
    fn wait(&self, duration: Duration);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadWaiter;

impl Waiter for ThreadWaiter {
    fn wait(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}
