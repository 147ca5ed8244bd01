use crate::host::stage::Stage;

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct VialCorkOptions {
    pub vial_selector: String,
    pub open_class: String,
    /// A second click on an open cork closes it instead of being ignored.
    pub allow_toggle: bool,
}

impl Default for VialCorkOptions {
    fn default() -> Self {
        Self {
            vial_selector: ".vials__vial".to_owned(),
            open_class: "is-cork-open".to_owned(),
            allow_toggle: false,
        }
    }
}

/// A cork being pulled: the vial that starts the ceremony and the memory it holds.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Trigger {
    /// `#id` selector of the vial.
    pub trigger_element: String,
    /// The vial's `data-memory`.
    pub payload_id: Option<String>,
}

/// Cork clicks on the vial shelf.
#[derive(Clone, Debug)]
pub struct VialCork {
    opts: VialCorkOptions,
}

impl VialCork {
    /// `None` when the shelf has no vials.
    pub fn create(opts: VialCorkOptions, stage: &Stage) -> Option<Self> {
        if stage.query(&opts.vial_selector).is_none() {
            return None;
        }
        Some(Self { opts })
    }

    pub fn options(&self) -> &VialCorkOptions {
        &self.opts
    }

    /// Handle a click on `vial`. Clicks that miss the cork, land on an already open
    /// cork, or target something that is not a vial yield nothing.
    pub fn click(&self, stage: &mut Stage, vial: &str, on_cork: bool) -> Option<Trigger> {
        if !on_cork {
            return None;
        }
        let el = stage.query(vial)?;
        if !el.matches(&self.opts.vial_selector) {
            return None;
        }
        let id = el.id.clone()?;
        let payload_id = el.data.get("memory").cloned();

        let open = &self.opts.open_class;
        if el.has_class(open) {
            if self.opts.allow_toggle {
                stage.remove_class(vial, open);
                tracing::debug!(vial, "cork closed");
            }
            return None;
        }
        stage.add_class(vial, open);
        tracing::debug!(vial, payload = ?payload_id, "cork opened");
        Some(Trigger {
            trigger_element: format!("#{id}"),
            payload_id,
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/orchestrate/trigger.rs"]
mod tests;
