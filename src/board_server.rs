use actix::prelude::*;
use log::{debug, info};
use serde::Serialize;
use std::collections::HashMap;

use crate::board::BoardController;
use crate::task_store::{StoreEvent, SubscriptionId};

/// Store change pushed to every connected board.
#[derive(Message, Clone, Debug, Serialize)]
#[rtype(result = "()")]
pub struct BoardChanged {
    pub event: StoreEvent,
}

#[derive(Message)]
#[rtype(result = "usize")]
pub struct Connect {
    pub addr: Recipient<BoardChanged>,
}

#[derive(Message)]
#[rtype(result = "()")]
pub struct Disconnect {
    pub session_id: usize,
}

/// Fan-out hub between the task store and websocket sessions.
#[derive(Default)]
pub struct BoardServer {
    sessions: HashMap<usize, Recipient<BoardChanged>>,
    next_id: usize,
}

impl BoardServer {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Push every store change on `board` to the hub.
pub fn forward_store_events(board: &mut BoardController, server: Addr<BoardServer>) -> SubscriptionId {
    board.subscribe(move |event| server.do_send(BoardChanged { event: event.clone() }))
}

impl Actor for BoardServer {
    type Context = Context<Self>;
}

impl Handler<Connect> for BoardServer {
    type Result = usize;

    fn handle(&mut self, msg: Connect, _: &mut Context<Self>) -> usize {
        self.next_id += 1;
        let id = self.next_id;
        self.sessions.insert(id, msg.addr);
        info!("Board session {} connected ({} open)", id, self.sessions.len());
        id
    }
}

impl Handler<Disconnect> for BoardServer {
    type Result = ();

    fn handle(&mut self, msg: Disconnect, _: &mut Context<Self>) {
        if self.sessions.remove(&msg.session_id).is_some() {
            info!("Board session {} disconnected", msg.session_id);
        }
    }
}

impl Handler<BoardChanged> for BoardServer {
    type Result = ();

    fn handle(&mut self, msg: BoardChanged, _: &mut Context<Self>) {
        debug!("broadcasting {:?} to {} sessions", msg.event, self.sessions.len());
        for addr in self.sessions.values() {
            addr.do_send(msg.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board_service::BoardService;
    use crate::models::{TaskDraft, TaskId, TaskStatus};
    use crate::persistence::InMemoryTaskRepository;
    use std::sync::{Arc, Mutex};

    /// Stand-in for a websocket session that records what it was sent.
    struct Listener {
        seen: Arc<Mutex<Vec<StoreEvent>>>,
    }

    impl Actor for Listener {
        type Context = Context<Self>;
    }

    impl Handler<BoardChanged> for Listener {
        type Result = ();

        fn handle(&mut self, msg: BoardChanged, _: &mut Context<Self>) {
            self.seen.lock().unwrap().push(msg.event);
        }
    }

    #[derive(Message)]
    #[rtype(result = "()")]
    struct Flush;

    impl Handler<Flush> for Listener {
        type Result = ();

        fn handle(&mut self, _: Flush, _: &mut Context<Self>) {}
    }

    fn listener() -> (Addr<Listener>, Arc<Mutex<Vec<StoreEvent>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        (Listener { seen: seen.clone() }.start(), seen)
    }

    #[actix::test]
    async fn broadcasts_to_connected_sessions_only() {
        let server = BoardServer::new().start();
        let (listener, seen) = listener();

        let id = server.send(Connect { addr: listener.clone().recipient() }).await.unwrap();
        let event = StoreEvent::Deleted { task_id: TaskId::from("t1") };
        server.send(BoardChanged { event: event.clone() }).await.unwrap();

        server.send(Disconnect { session_id: id }).await.unwrap();
        server
            .send(BoardChanged { event: StoreEvent::Reloaded { count: 0 } })
            .await
            .unwrap();

        listener.send(Flush).await.unwrap();
        assert_eq!(*seen.lock().unwrap(), vec![event]);
    }

    #[actix::test]
    async fn board_changes_reach_connected_sessions() {
        let server = BoardServer::new().start();
        let (listener, seen) = listener();
        server.send(Connect { addr: listener.clone().recipient() }).await.unwrap();

        let service = BoardService::load(Arc::new(InMemoryTaskRepository::new())).await.unwrap();
        forward_store_events(&mut *service.lock().await, server.clone());

        let mut draft = TaskDraft::new_in(TaskStatus::Todo);
        draft.title = "Letterheads".into();
        draft.deadline = "2026-11-02".into();
        let created = service.apply(|b| b.create_task(&draft)).await.unwrap();
        let task_id = created.task().task_id.clone();
        service.apply(|b| b.change_status(&task_id, "review")).await.unwrap();

        // drain the hub, then the session
        server.send(Disconnect { session_id: 0 }).await.unwrap();
        listener.send(Flush).await.unwrap();
        assert_eq!(
            *seen.lock().unwrap(),
            vec![
                StoreEvent::Added { task_id: task_id.clone() },
                StoreEvent::StatusChanged {
                    task_id,
                    from: TaskStatus::Todo,
                    to: TaskStatus::Review,
                },
            ]
        );
    }
}
