use std::sync::Arc;

use crate::domain::ImageError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ThemeMode {
    #[default]
    Light,
    Dark,
}

impl ThemeMode {
    pub fn toggled(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }

    pub fn is_dark(self) -> bool {
        matches!(self, Self::Dark)
    }
}

pub trait ThemePreferenceStore: Send + Sync {
    fn load_theme(&self) -> Option<ThemeMode>;

    fn store_theme(&self, mode: ThemeMode) -> Result<(), ImageError>;
}

/// Process-wide light/dark preference. Bootstrap order: persisted value,
/// then the window-system appearance, then Light. Toggling persists
/// immediately; a failed write keeps the visual change for the session.
pub struct ThemeController {
    store: Arc<dyn ThemePreferenceStore>,
    mode: ThemeMode,
}

impl ThemeController {
    pub fn bootstrap(store: Arc<dyn ThemePreferenceStore>, system_prefers_dark: bool) -> Self {
        let mode = store.load_theme().unwrap_or(if system_prefers_dark {
            ThemeMode::Dark
        } else {
            ThemeMode::Light
        });
        Self { store, mode }
    }

    pub fn mode(&self) -> ThemeMode {
        self.mode
    }

    pub fn toggle(&mut self) -> ThemeMode {
        self.mode = self.mode.toggled();
        if let Err(error) = self.store.store_theme(self.mode) {
            eprintln!("pictor: theme preference could not be persisted: {error}");
        }
        self.mode
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use crate::domain::ImageError;

    use super::{ThemeController, ThemeMode, ThemePreferenceStore};

    #[derive(Default)]
    struct MemoryStore {
        value: Mutex<Option<ThemeMode>>,
        fail_writes: bool,
    }

    impl MemoryStore {
        fn with_value(value: Option<ThemeMode>) -> Arc<Self> {
            Arc::new(Self {
                value: Mutex::new(value),
                fail_writes: false,
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                value: Mutex::new(None),
                fail_writes: true,
            })
        }

        fn stored(&self) -> Option<ThemeMode> {
            *self.value.lock().expect("store lock poisoned")
        }
    }

    impl ThemePreferenceStore for MemoryStore {
        fn load_theme(&self) -> Option<ThemeMode> {
            self.stored()
        }

        fn store_theme(&self, mode: ThemeMode) -> Result<(), ImageError> {
            if self.fail_writes {
                return Err(ImageError::internal("preference store unavailable"));
            }
            *self.value.lock().expect("store lock poisoned") = Some(mode);
            Ok(())
        }
    }

    #[test]
    fn bootstrap_prefers_persisted_value_over_system_signal() {
        let store = MemoryStore::with_value(Some(ThemeMode::Light));
        let controller = ThemeController::bootstrap(store, true);

        assert_eq!(controller.mode(), ThemeMode::Light);
    }

    #[test]
    fn bootstrap_falls_back_to_system_signal_then_light() {
        let dark_system = ThemeController::bootstrap(MemoryStore::with_value(None), true);
        assert_eq!(dark_system.mode(), ThemeMode::Dark);

        let light_default = ThemeController::bootstrap(MemoryStore::with_value(None), false);
        assert_eq!(light_default.mode(), ThemeMode::Light);
    }

    #[test]
    fn toggle_flips_and_persists_immediately() {
        let store = MemoryStore::with_value(Some(ThemeMode::Light));
        let mut controller = ThemeController::bootstrap(Arc::clone(&store) as Arc<dyn ThemePreferenceStore>, false);

        assert_eq!(controller.toggle(), ThemeMode::Dark);
        assert_eq!(store.stored(), Some(ThemeMode::Dark));
    }

    #[test]
    fn double_toggle_restores_mode_and_persisted_value() {
        let store = MemoryStore::with_value(Some(ThemeMode::Dark));
        let mut controller = ThemeController::bootstrap(Arc::clone(&store) as Arc<dyn ThemePreferenceStore>, false);

        controller.toggle();
        controller.toggle();

        assert_eq!(controller.mode(), ThemeMode::Dark);
        assert_eq!(store.stored(), Some(ThemeMode::Dark));
    }

    #[test]
    fn toggle_applies_for_the_session_even_when_persistence_fails() {
        let store = MemoryStore::failing();
        let mut controller = ThemeController::bootstrap(Arc::clone(&store) as Arc<dyn ThemePreferenceStore>, false);

        assert_eq!(controller.toggle(), ThemeMode::Dark);
        assert_eq!(controller.mode(), ThemeMode::Dark);
        assert_eq!(store.stored(), None);
    }
}
