// Command dispatcher

use super::reply::Reply;
use super::{keys, set};
use crate::storage::SetStore;
use bytes::Bytes;
use std::sync::Arc;
use tracing::debug;

/// Routes an argument vector to the matching handler. Cheap to clone; every
/// clone shares the same store.
#[derive(Clone)]
pub struct CommandDispatcher {
    store: Arc<SetStore>,
}

impl CommandDispatcher {
    pub fn new(store: Arc<SetStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<SetStore> {
        &self.store
    }

    pub fn dispatch(&self, mut args: Vec<Bytes>) -> Reply {
        if args.is_empty() {
            return Reply::Error("ERR empty command".to_string());
        }

        // Extract command name (case-insensitive)
        let cmd_bytes = args.remove(0);
        let cmd = match std::str::from_utf8(&cmd_bytes) {
            Ok(s) => s.to_uppercase(),
            Err(_) => return Reply::Error("ERR invalid command name".to_string()),
        };
        debug!(command = %cmd, argc = args.len(), "dispatching command");

        let store = self.store.as_ref();
        match cmd.as_str() {
            // Set commands
            "SADD" => set::sadd(store, &args),
            "SREM" => set::srem(store, &args),
            "SCARD" => set::scard(store, &args),
            "SMEMBERS" => set::smembers(store, &args),
            "SISMEMBER" => set::sismember(store, &args),
            "SMISMEMBER" => set::smismember(store, &args),
            "SMOVE" => set::smove(store, &args),
            "SPOP" => set::spop(store, &args),
            "SRANDMEMBER" => set::srandmember(store, &args),
            "SUNION" => set::sunion(store, &args),
            "SINTER" => set::sinter(store, &args),
            "SDIFF" => set::sdiff(store, &args),
            "SUNIONSTORE" => set::sunionstore(store, &args),
            "SINTERSTORE" => set::sinterstore(store, &args),
            "SDIFFSTORE" => set::sdiffstore(store, &args),
            "SINTERCARD" => set::sintercard(store, &args),

            // Key space
            "PING" => keys::ping(&args),
            "DEL" => keys::del(store, &args),
            "EXISTS" => keys::exists(store, &args),
            "TYPE" => keys::key_type(store, &args),
            "DBSIZE" => keys::dbsize(store, &args),
            "FLUSHALL" => keys::flushall(store, &args),
            "SET" => keys::set(store, &args),
            "GET" => keys::get(store, &args),

            _ => Reply::Error(format!(
                "ERR unknown command '{}'",
                String::from_utf8_lossy(&cmd_bytes)
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(dispatcher: &CommandDispatcher, line: &str) -> Reply {
        dispatcher.dispatch(line.split_whitespace().map(|s| Bytes::copy_from_slice(s.as_bytes())).collect())
    }

    #[test]
    fn test_dispatch_is_case_insensitive() {
        let dispatcher = CommandDispatcher::new(Arc::new(SetStore::new()));
        assert_eq!(run(&dispatcher, "sadd s a b"), Reply::Integer(2));
        assert_eq!(run(&dispatcher, "SCard s"), Reply::Integer(2));
    }

    #[test]
    fn test_unknown_and_empty() {
        let dispatcher = CommandDispatcher::new(Arc::new(SetStore::new()));
        assert_eq!(
            run(&dispatcher, "nosuch x"),
            Reply::Error("ERR unknown command 'nosuch'".to_string())
        );
        assert!(dispatcher.dispatch(vec![]).is_error());
    }

    #[test]
    fn test_clones_share_store() {
        let dispatcher = CommandDispatcher::new(Arc::new(SetStore::new()));
        let other = dispatcher.clone();
        run(&dispatcher, "SADD s a");
        assert_eq!(run(&other, "SISMEMBER s a"), Reply::Integer(1));
        assert_eq!(other.store().len(), 1);
    }

    #[test]
    fn test_wrongtype_through_dispatch() {
        let dispatcher = CommandDispatcher::new(Arc::new(SetStore::new()));
        run(&dispatcher, "SET k v");
        assert!(run(&dispatcher, "SADD k a").is_error());
        assert_eq!(run(&dispatcher, "SUNIONSTORE k missing"), Reply::Integer(0));
        assert_eq!(run(&dispatcher, "TYPE k"), Reply::SimpleString("none".to_string()));
    }
}
