use std::collections::VecDeque;
use std::future::{ready, Ready};
use std::sync::{Arc, Mutex};

use actix_web::dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::Error;
use chrono::{NaiveDateTime, Utc};
use futures_util::future::LocalBoxFuture;
use log::warn;

/// Queue holds at most this many unfetched visits; older ones are dropped
/// rather than letting the queue grow without bound if the flush job stalls.
const MAX_QUEUED: usize = 1000;

#[derive(Debug, Clone, PartialEq)]
pub struct VisitRecord {
    pub user_id: Option<i64>,
    pub path: String,
    pub ip_address: Option<String>,
    pub visited_at: NaiveDateTime,
}

/// In-process buffer between the request path and the periodic flush job.
pub struct VisitQueue {
    records: Mutex<VecDeque<VisitRecord>>,
}

impl VisitQueue {
    pub fn new() -> VisitQueue {
        VisitQueue {
            records: Mutex::new(VecDeque::new()),
        }
    }

    pub fn push(&self, record: VisitRecord) {
        let mut records = self.records.lock().unwrap();
        if records.len() >= MAX_QUEUED {
            records.pop_front();
            warn!("Visit queue full, dropping oldest record");
        }
        records.push_back(record);
    }

    /// Removes and returns up to `limit` records, oldest first.
    pub fn drain(&self, limit: usize) -> Vec<VisitRecord> {
        let mut records = self.records.lock().unwrap();
        let n = limit.min(records.len());
        records.drain(..n).collect()
    }

    pub fn len(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for VisitQueue {
    fn default() -> VisitQueue {
        VisitQueue::new()
    }
}

/// Middleware recording one VisitRecord per handled request. Attribution is
/// best effort: the optional x-user-id header, the client ip from the
/// connection info (honours X-Forwarded-For).
pub struct PageVisitTracker {
    queue: Arc<VisitQueue>,
}

impl PageVisitTracker {
    pub fn new(queue: Arc<VisitQueue>) -> PageVisitTracker {
        PageVisitTracker { queue }
    }
}

impl<S, B> Transform<S, ServiceRequest> for PageVisitTracker
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = PageVisitMiddleware<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(PageVisitMiddleware {
            service,
            queue: self.queue.clone(),
        }))
    }
}

pub struct PageVisitMiddleware<S> {
    service: S,
    queue: Arc<VisitQueue>,
}

impl<S, B> Service<ServiceRequest> for PageVisitMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let path = req.path().to_string();
        let ip_address = req
            .connection_info()
            .realip_remote_addr()
            .map(|ip| ip.to_string());
        let user_id = req
            .headers()
            .get("x-user-id")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<i64>().ok());

        let queue = self.queue.clone();
        let fut = self.service.call(req);
        Box::pin(async move {
            let res = fut.await?;
            queue.push(VisitRecord {
                user_id,
                path,
                ip_address,
                visited_at: Utc::now().naive_utc(),
            });
            Ok(res)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(path: &str) -> VisitRecord {
        VisitRecord {
            user_id: None,
            path: path.to_string(),
            ip_address: None,
            visited_at: Utc::now().naive_utc(),
        }
    }

    #[test]
    fn drain_is_fifo_and_bounded() {
        let queue = VisitQueue::new();
        queue.push(record("/a"));
        queue.push(record("/b"));
        queue.push(record("/c"));

        let drained = queue.drain(2);
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[0].path, "/a");
        assert_eq!(drained[1].path, "/b");
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn queue_drops_oldest_when_full() {
        let queue = VisitQueue::new();
        for i in 0..(MAX_QUEUED + 10) {
            queue.push(record(&format!("/p{}", i)));
        }
        assert_eq!(queue.len(), MAX_QUEUED);
        let first = queue.drain(1);
        assert_eq!(first[0].path, "/p10");
    }
}
