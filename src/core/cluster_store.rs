//! Implementation of the synthetic cluster store which stands in for the api server and its
//! persistent storage. Holds nodes, namespaces and pods in memory keyed by kind and name.
//!
//! Every successful write is appended to an event log. Placement algorithms keep their caches up
//! to date by watching the store: a [`WatchCursor`] observes each add and update exactly once and
//! in the order the writes happened.

use std::collections::{BTreeMap, HashMap};
use std::fmt::{self, Debug};

use downcast_rs::{impl_downcast, Downcast};
use dyn_clone::DynClone;
use log::debug;
use thiserror::Error;

use crate::core::node::{Namespace, Node};
use crate::core::pod::Pod;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ObjectKind {
    Node,
    Namespace,
    Pod,
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let resource = match self {
            ObjectKind::Node => "nodes",
            ObjectKind::Namespace => "namespaces",
            ObjectKind::Pod => "pods",
        };
        f.write_str(resource)
    }
}

/// Any object which may be kept in the cluster store.
pub trait StoreObject: Downcast + DynClone + Debug {
    fn kind(&self) -> ObjectKind;
    /// Identity of the object within its kind.
    fn key(&self) -> String;
}
impl_downcast!(StoreObject);
dyn_clone::clone_trait_object!(StoreObject);

/// Statically known kind, used by typed lookups.
pub trait KindOf {
    const KIND: ObjectKind;
}

macro_rules! store_object {
    ($type:ty, $kind:expr, |$object:ident| $key:expr) => {
        impl KindOf for $type {
            const KIND: ObjectKind = $kind;
        }

        impl StoreObject for $type {
            fn kind(&self) -> ObjectKind {
                $kind
            }

            fn key(&self) -> String {
                let $object = self;
                $key
            }
        }
    };
}

store_object!(Node, ObjectKind::Node, |node| node.metadata.name.clone());
store_object!(Namespace, ObjectKind::Namespace, |ns| ns.metadata.name.clone());
store_object!(Pod, ObjectKind::Pod, |pod| pod.key());

#[derive(Debug, Error, PartialEq)]
pub enum StoreError {
    #[error("{kind} {key:?} already exists")]
    DuplicateIdentity { kind: ObjectKind, key: String },
    #[error("{kind} {key:?} not found")]
    NotFound { kind: ObjectKind, key: String },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WatchEventType {
    Added,
    Modified,
}

#[derive(Debug, Clone)]
pub struct WatchEvent {
    pub event_type: WatchEventType,
    pub object: Box<dyn StoreObject>,
}

/// Position of a watcher in the store event log.
#[derive(Debug, Default)]
pub struct WatchCursor {
    position: usize,
}

#[derive(Debug, Default, Clone)]
pub struct ClusterStore {
    objects: HashMap<ObjectKind, BTreeMap<String, Box<dyn StoreObject>>>,
    events: Vec<WatchEvent>,
}

impl ClusterStore {
    pub fn new() -> Self {
        Default::default()
    }

    /// Adds a new object, fails if an object of the same kind and key is already stored.
    pub fn add<T: StoreObject>(&mut self, object: T) -> Result<(), StoreError> {
        let kind = object.kind();
        let key = object.key();
        let objects = self.objects.entry(kind).or_default();
        if objects.contains_key(&key) {
            return Err(StoreError::DuplicateIdentity { kind, key });
        }

        debug!("Store: added {} {:?}", kind, key);
        let object: Box<dyn StoreObject> = Box::new(object);
        objects.insert(key, object.clone());
        self.events.push(WatchEvent {
            event_type: WatchEventType::Added,
            object,
        });
        Ok(())
    }

    /// Replaces a stored object with the same kind and key as a whole.
    pub fn update<T: StoreObject>(&mut self, object: T) -> Result<(), StoreError> {
        let kind = object.kind();
        let key = object.key();
        let Some(stored) = self
            .objects
            .get_mut(&kind)
            .and_then(|objects| objects.get_mut(&key))
        else {
            return Err(StoreError::NotFound { kind, key });
        };

        debug!("Store: updated {} {:?}", kind, key);
        let object: Box<dyn StoreObject> = Box::new(object);
        *stored = object.clone();
        self.events.push(WatchEvent {
            event_type: WatchEventType::Modified,
            object,
        });
        Ok(())
    }

    pub fn get<T: StoreObject + KindOf>(&self, key: &str) -> Option<&T> {
        self.objects
            .get(&T::KIND)?
            .get(key)?
            .downcast_ref::<T>()
    }

    /// Current objects of a kind ordered by key.
    pub fn list<T: StoreObject + KindOf>(&self) -> Vec<&T> {
        self.objects
            .get(&T::KIND)
            .map(|objects| {
                objects
                    .values()
                    .filter_map(|object| object.downcast_ref::<T>())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn contains(&self, kind: ObjectKind, key: &str) -> bool {
        self.objects
            .get(&kind)
            .is_some_and(|objects| objects.contains_key(key))
    }

    pub fn count(&self, kind: ObjectKind) -> usize {
        self.objects.get(&kind).map_or(0, |objects| objects.len())
    }

    /// Starts a watch which first replays every write made so far.
    pub fn watch(&self) -> WatchCursor {
        WatchCursor { position: 0 }
    }

    /// Returns the writes the cursor has not seen yet and moves it past them.
    pub fn poll(&self, cursor: &mut WatchCursor) -> &[WatchEvent] {
        let start = cursor.position.min(self.events.len());
        cursor.position = self.events.len();
        &self.events[start..]
    }
}
