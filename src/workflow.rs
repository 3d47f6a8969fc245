use crate::error::Result;
use crate::mutate;
use crate::render::{MapRenderer, MapSurface, SurfaceEvent};
use crate::store::DistrictStore;
use crate::types::PowerStatus;
use std::sync::Arc;
use tracing::{info, warn};

/// Values shown in (and collected from) the operator's edit form.
#[derive(Debug, Clone, PartialEq)]
pub struct FormValues {
    pub district: String,
    pub status: PowerStatus,
    pub outage_start: String,
    pub outage_end: String,
}

impl FormValues {
    fn prefill(district: &crate::types::District) -> Self {
        FormValues {
            district: district.name.clone(),
            status: district.status.clone(),
            outage_start: district.outage_start.clone().unwrap_or_default(),
            outage_end: district.outage_end.clone().unwrap_or_default(),
        }
    }

    fn empty(district: &str) -> Self {
        FormValues {
            district: district.to_string(),
            status: PowerStatus::Unset,
            outage_start: String::new(),
            outage_end: String::new(),
        }
    }
}

/// Outcome of one form activation. The widget emits exactly one of these
/// per `show`.
#[derive(Debug, Clone, PartialEq)]
pub enum FormEvent {
    Submitted(FormValues),
    Cancelled,
}

/// The operator input widget. The core owns the values and the state
/// transitions; the widget only displays and collects.
pub trait EditForm {
    fn show(&mut self, prefill: FormValues);
    fn hide(&mut self);
}

#[derive(Debug, Clone, PartialEq)]
pub enum EditState {
    Idle,
    Editing { district: String },
}

/// Orchestrates the edit cycle: edit request in, mutated snapshot and
/// full redraw out. All methods run to completion on the calling thread;
/// nothing here suspends mid-mutation.
pub struct UpdateWorkflow<S: MapSurface, F: EditForm> {
    store: DistrictStore,
    renderer: MapRenderer,
    surface: S,
    form: F,
    state: EditState,
}

impl<S: MapSurface, F: EditForm> UpdateWorkflow<S, F> {
    pub fn new(store: DistrictStore, renderer: MapRenderer, surface: S, form: F) -> Self {
        UpdateWorkflow {
            store,
            renderer,
            surface,
            form,
            state: EditState::Idle,
        }
    }

    pub fn state(&self) -> &EditState {
        &self.state
    }

    pub fn store(&self) -> &DistrictStore {
        &self.store
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn form(&self) -> &F {
        &self.form
    }

    /// Loads the initial document and performs the first draw. On failure
    /// nothing is published and nothing is drawn.
    pub fn load_document<R: std::io::Read>(&mut self, reader: R) -> Result<()> {
        let dataset = self.store.load(reader)?;
        info!(districts = dataset.len(), "initial dataset loaded");
        self.renderer.render(&dataset, &mut self.surface);
        Ok(())
    }

    pub fn handle_surface_event(&mut self, event: SurfaceEvent) {
        match event {
            SurfaceEvent::EditRequested(district) => self.start_edit(&district),
            SurfaceEvent::DetailLevelChanged(level) => {
                self.renderer.apply_detail_level(level, &mut self.surface);
            }
        }
    }

    pub fn handle_form_event(&mut self, event: FormEvent) {
        match event {
            FormEvent::Submitted(values) => {
                if let Err(e) = self.submit(
                    &values.district,
                    values.status,
                    &values.outage_start,
                    &values.outage_end,
                ) {
                    warn!(error = %e, "edit submission rejected");
                }
            }
            FormEvent::Cancelled => self.cancel(),
        }
    }

    /// Idle → Editing. Rejected (log only) before the first load. An
    /// unknown district name still opens the form, pre-filled with
    /// defaults, to tolerate a snapshot that lags the visible map.
    pub fn start_edit(&mut self, district_name: &str) {
        let dataset = match self.store.current() {
            Ok(d) => d,
            Err(_) => {
                warn!(
                    district = district_name,
                    "edit requested before any dataset was loaded, rejecting"
                );
                return;
            }
        };

        let prefill = match dataset.find(district_name) {
            Some(district) => FormValues::prefill(district),
            None => {
                warn!(
                    district = district_name,
                    "edit requested for unknown district, pre-filling defaults"
                );
                FormValues::empty(district_name)
            }
        };

        self.form.show(prefill);
        self.state = EditState::Editing {
            district: district_name.to_string(),
        };
    }

    /// Editing → Idle, entered values discarded.
    pub fn cancel(&mut self) {
        self.form.hide();
        self.state = EditState::Idle;
    }

    /// Editing → Idle. Applies the update, publishes the new snapshot,
    /// then redraws. `apply` is pure and `replace` runs only after it
    /// returns, so a failure ahead of `replace` leaves the prior snapshot
    /// and state fully valid.
    pub fn submit(
        &mut self,
        district_name: &str,
        status: PowerStatus,
        outage_start: &str,
        outage_end: &str,
    ) -> Result<()> {
        let current = self.store.current()?;
        let next = Arc::new(mutate::apply(
            &current,
            district_name,
            status,
            outage_start,
            outage_end,
        ));
        self.store.replace(Arc::clone(&next));
        self.renderer.render(&next, &mut self.surface);
        self.form.hide();
        self.state = EditState::Idle;
        Ok(())
    }
}
