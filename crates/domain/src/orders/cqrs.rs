use std::sync::Arc;
use cqrs_es::{
    persist::{PersistedEventStore, ViewRepository},
    CqrsFramework, Query as CqrsQuery,
};
use dynamo_es::{DynamoEventRepository, DynamoViewRepository};
use super::{DispatchQuery, EventDispatcher, Order, Query, RegistryQuery, Services, View};
use crate::config::StoreConfig;
use crate::store::DynamoStore;

pub type OrderStore = PersistedEventStore<DynamoEventRepository, Order>;

pub type OrderCqrs = CqrsFramework<Order, OrderStore>;

pub fn init(
    client: aws_sdk_dynamodb::Client,
    config: &StoreConfig,
    repo: Arc<Box<dyn ViewRepository<View, Order>>>,
    dispatcher: Option<Arc<dyn EventDispatcher>>,
) -> Arc<OrderCqrs> {
    let store: OrderStore = PersistedEventStore::new_snapshot_store(
        DynamoEventRepository::new(client.clone())
            .with_tables(&config.event_log_table, &config.event_snapshots_table),
        config.snapshot_size,
    );

    let registry = Arc::new(DynamoStore::new(client, config.clone()));
    let mut queries: Vec<Box<dyn CqrsQuery<Order>>> = vec![
        Box::new(Query::new(repo)),
        Box::new(RegistryQuery::new(registry)),
    ];
    if let Some(dispatcher) = dispatcher {
        queries.push(Box::new(DispatchQuery::new(dispatcher)));
    }

    Arc::new(CqrsFramework::new(store, queries, Services::default()))
}

pub fn init_repo(
    client: aws_sdk_dynamodb::Client,
    config: &StoreConfig,
) -> Arc<Box<dyn ViewRepository<View, Order>>> {
    Arc::new(Box::new(DynamoViewRepository::new(
        &config.orders_view_table,
        client,
    )))
}
