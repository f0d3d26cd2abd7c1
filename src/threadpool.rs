//! A fixed-size worker pool for evaluating genome fitness concurrently.
//!
//! Mutation, speciation, and reproduction stay single-threaded for determinism; only fitness
//! evaluation is meant to be handed off here. `submit` returns a [`WorkResult`] that blocks on
//! `recv` when read, standing in for a future in a synchronous setting.

use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread;

enum Message {
    Work(Box<dyn FnOnce() + Send>),
    Shutdown,
}

/// A pending result from a job submitted to a [`ThreadPool`].
pub struct WorkResult<T> {
    receiver: mpsc::Receiver<T>,
}

impl<T> WorkResult<T> {
    /// Block until the job completes and return its result.
    pub fn join(self) -> T {
        self.receiver.recv().expect("worker dropped without sending a result")
    }
}

struct Worker {
    handle: Option<thread::JoinHandle<()>>,
}

impl Worker {
    fn new(receiver: Arc<Mutex<mpsc::Receiver<Message>>>) -> Self {
        let handle = thread::spawn(move || loop {
            let message = receiver.lock().expect("worker pool mutex poisoned").recv();
            match message {
                Ok(Message::Work(job)) => job(),
                Ok(Message::Shutdown) | Err(_) => break,
            }
        });
        Self { handle: Some(handle) }
    }
}

/// A pool of worker threads pulling jobs off a shared FIFO queue.
pub struct ThreadPool {
    sender: Option<mpsc::Sender<Message>>,
    workers: Vec<Worker>,
}

impl ThreadPool {
    /// `num_threads == 0` defaults to the available parallelism.
    pub fn new(num_threads: usize) -> Self {
        let num_threads = if num_threads == 0 {
            thread::available_parallelism().map(|n| n.get()).unwrap_or(1)
        } else {
            num_threads
        };

        let (sender, receiver) = mpsc::channel();
        let receiver = Arc::new(Mutex::new(receiver));
        let workers = (0..num_threads).map(|_| Worker::new(Arc::clone(&receiver))).collect();

        Self {
            sender: Some(sender),
            workers,
        }
    }

    pub fn num_workers(&self) -> usize {
        self.workers.len()
    }

    /// Submit a job and get back a handle to read its result later.
    pub fn submit<F, T>(&self, job: F) -> WorkResult<T>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let (tx, rx) = mpsc::channel();
        let wrapped = move || {
            let _ = tx.send(job());
        };
        self.sender
            .as_ref()
            .expect("pool sender dropped before shutdown")
            .send(Message::Work(Box::new(wrapped)))
            .expect("worker pool queue closed");
        WorkResult { receiver: rx }
    }

    /// Submit a batch and collect all results in submission order, blocking until every job
    /// completes.
    pub fn map<F, T>(&self, jobs: impl IntoIterator<Item = F>) -> Vec<T>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        jobs.into_iter().map(|job| self.submit(job)).collect::<Vec<_>>().into_iter().map(WorkResult::join).collect()
    }
}

impl Drop for ThreadPool {
    fn drop(&mut self) {
        self.sender.take();
        for worker in &mut self.workers {
            if let Some(handle) = worker.handle.take() {
                let _ = handle.join();
            }
        }
    }
}

#[cfg(feature = "parallel")]
pub mod parallel {
    //! A rayon-backed convenience path for fitness evaluation, offered as an alternative to
    //! [`super::ThreadPool`] when the caller would rather not manage a pool's lifetime.
    use rayon::prelude::*;

    use crate::genome::Genome;

    /// Evaluate `f` for every genome in parallel and assign the result as its fitness.
    pub fn evaluate_all(genomes: &mut [Genome], f: impl Fn(&Genome) -> f64 + Sync) {
        genomes.par_iter_mut().for_each(|g| {
            let fitness = f(g);
            g.fitness = fitness;
        });
    }
}
