use crate::error::FilterError;
use async_trait::async_trait;
use std::fmt::Display;
use std::sync::Arc;

pub type Result<T> = std::result::Result<T, FilterError>;

/// Where a filter's state lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterScope {
    /// Held in this process only. Correct only for single-instance
    /// deployments: other instances never see this process's additions.
    Local,
    /// Held in a location shared by every instance.
    Shared,
}

impl Display for FilterScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FilterScope::Local => f.write_str("local"),
            FilterScope::Shared => f.write_str("shared"),
        }
    }
}

/// Approximate set membership for long URLs that already have a code.
///
/// `test` never returns `false` for an item that was added. It may return
/// `true` for an item that was never added, at a bounded rate.
#[async_trait]
pub trait MembershipFilter: Send + Sync + 'static {
    async fn add(&self, item: &str) -> Result<()>;

    async fn test(&self, item: &str) -> Result<bool>;

    fn scope(&self) -> FilterScope;
}

#[async_trait]
impl<F: MembershipFilter + ?Sized> MembershipFilter for Arc<F> {
    async fn add(&self, item: &str) -> Result<()> {
        (**self).add(item).await
    }

    async fn test(&self, item: &str) -> Result<bool> {
        (**self).test(item).await
    }

    fn scope(&self) -> FilterScope {
        (**self).scope()
    }
}
