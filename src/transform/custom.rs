//! Caller-provided transformation: a function pointer plus opaque user
//! data, the one open branch in an otherwise closed variant set. A cleanup
//! callback runs on pipeline teardown.

use super::Action;
use crate::tokenizer::Token;

type ApplyFn = dyn Fn(&Token, &[u8], &mut dyn std::any::Any) -> Action + Send + Sync;
type CleanupFn = dyn Fn(&mut dyn std::any::Any) + Send + Sync;

pub struct CustomTransform {
    pub name: String,
    apply_fn: Box<ApplyFn>,
    cleanup_fn: Option<Box<CleanupFn>>,
    user_data: Box<dyn std::any::Any + Send + Sync>,
}

impl CustomTransform {
    pub fn new(
        name: impl Into<String>,
        user_data: impl std::any::Any + Send + Sync,
        apply_fn: impl Fn(&Token, &[u8], &mut dyn std::any::Any) -> Action + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            apply_fn: Box::new(apply_fn),
            cleanup_fn: None,
            user_data: Box::new(user_data),
        }
    }

    pub fn with_cleanup(mut self, cleanup: impl Fn(&mut dyn std::any::Any) + Send + Sync + 'static) -> Self {
        self.cleanup_fn = Some(Box::new(cleanup));
        self
    }

    pub fn apply(&mut self, token: &Token, input: &[u8]) -> Action {
        (self.apply_fn)(token, input, self.user_data.as_mut())
    }
}

impl Drop for CustomTransform {
    fn drop(&mut self) {
        if let Some(cleanup) = &self.cleanup_fn {
            cleanup(self.user_data.as_mut());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::TokenKind;

    #[test]
    fn custom_transform_can_drop_based_on_shared_counter() {
        let mut transform = CustomTransform::new("drop-every-other", 0usize, |_t, _input, data| {
            let counter = data.downcast_mut::<usize>().unwrap();
            *counter += 1;
            if *counter % 2 == 0 {
                Action::Drop
            } else {
                Action::Keep
            }
        });
        let token = Token {
            kind: TokenKind::Number,
            start: 0,
            end: 1,
            nesting_depth: 0,
            repaired: None,
        };
        let results: Vec<_> = (0..4)
            .map(|_| matches!(transform.apply(&token, b"1"), Action::Keep))
            .collect();
        assert_eq!(results, vec![true, false, true, false]);
    }

    #[test]
    fn cleanup_runs_on_drop() {
        use std::sync::atomic::{AtomicBool, Ordering};
        use std::sync::Arc;

        let flag = Arc::new(AtomicBool::new(false));
        let flag_for_cleanup = Arc::clone(&flag);
        {
            let _transform = CustomTransform::new("noop", (), |_t, _i, _d| Action::Keep)
                .with_cleanup(move |_| flag_for_cleanup.store(true, Ordering::SeqCst));
        }
        assert!(flag.load(Ordering::SeqCst));
    }
}
