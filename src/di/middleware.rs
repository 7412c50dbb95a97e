//! Installs a fresh [`DIContext`] per request as ordinary middleware.
//!
//! The context is stored in the request's extensions so handlers (and any
//! extractor built on top of it) can resolve services without threading a
//! parameter through every signature. Cleanup is automatic: `DIContext::drop`
//! runs scope cleanup LIFO once the last `Arc` reference — the one held by the
//! request's extensions — is dropped at the end of dispatch.

use std::sync::Arc;

use crate::{
  di::{DiContainer, DIContext},
  router::Router,
  types::Request,
};

/// Installs `container.create_context()` into every request's extensions.
#[derive(Clone)]
pub struct DiContextPlugin {
  container: DiContainer,
}

impl DiContextPlugin {
  pub fn new(container: DiContainer) -> Self {
    Self { container }
  }

  /// Registers this middleware on `router`, ahead of route/group middleware.
  pub fn install(&self, router: &Router) {
    let container = self.container.clone();
    router.middleware(move |mut req: Request, next| {
      let container = container.clone();
      async move {
        let context: Arc<DIContext> = Arc::new(container.create_context());
        req.extensions_mut().insert(context);
        next.run(req).await
      }
    });
  }
}
