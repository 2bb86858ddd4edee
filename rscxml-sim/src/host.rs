//! The simulator host.
//!
//! Implements the kernel vtable over two FIFO queues, a JSON datamodel
//! and the guard language. Every serviced action lands in the trace.

use crate::event::{descriptor_matches, Event};
use crate::guard::{GuardExpr, Scope};
use crate::trace::TraceEntry;
use rscxml_kernel::{Host, KernelError};
use rscxml_tables::{
    ElemData, ElemDoneData, ElemForeach, ElemInvoke, ElemParam, ElemSend, StateDesc, TransDesc,
};
use serde_json::Value;
use std::collections::VecDeque;

/// Target selecting the internal queue of the running machine.
const TARGET_INTERNAL: &str = "#_internal";

struct ForeachFrame {
    items: Vec<Value>,
    pos: usize,
}

/// The reference host.
pub struct SimHost {
    internal: VecDeque<Event>,
    external: VecDeque<Event>,
    data: Value,
    current: Option<Event>,
    frames: Vec<ForeachFrame>,
    trace: Vec<TraceEntry>,
}

impl Default for SimHost {
    fn default() -> Self {
        Self::new()
    }
}

impl SimHost {
    pub fn new() -> Self {
        Self {
            internal: VecDeque::new(),
            external: VecDeque::new(),
            data: Value::Object(Default::default()),
            current: None,
            frames: Vec::new(),
            trace: Vec::new(),
        }
    }

    /// Seeds the datamodel before the machine starts.
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = data;
        self
    }

    /// Queues an external event.
    pub fn post(&mut self, event: Event) {
        self.external.push_back(event);
    }

    /// The datamodel object.
    pub fn data(&self) -> &Value {
        &self.data
    }

    /// Everything recorded so far.
    pub fn trace(&self) -> &[TraceEntry] {
        &self.trace
    }

    /// True when both queues are drained.
    pub fn queues_empty(&self) -> bool {
        self.internal.is_empty() && self.external.is_empty()
    }

    fn scope(&self) -> Scope<'_> {
        Scope {
            data: &self.data,
            event: self.current.as_ref(),
        }
    }

    /// Evaluates a value expression: a JSON literal, a `ctx.`/`_event.`
    /// path, or a bare string.
    fn eval_expr(&self, expr: &str) -> Value {
        let trimmed = expr.trim();
        if trimmed.starts_with("ctx.") || trimmed.starts_with("_event.") {
            return self.scope().lookup(trimmed);
        }
        serde_json::from_str(trimmed).unwrap_or_else(|_| Value::String(trimmed.to_string()))
    }

    fn eval_cond(&self, cond: &str) -> Result<bool, KernelError> {
        let guard = GuardExpr::parse(cond)
            .map_err(|err| KernelError::exec(format!("guard '{}': {}", cond, err)))?;
        Ok(guard.eval(self.scope()))
    }

    /// Writes through a `ctx.`-rooted location, creating intermediate
    /// objects.
    fn set_path(&mut self, location: &str, value: Value) -> Result<(), KernelError> {
        let path = location
            .strip_prefix("ctx.")
            .ok_or_else(|| KernelError::exec(format!("location '{}' is not ctx-rooted", location)))?;
        let mut current = &mut self.data;
        let segments: Vec<&str> = path.split('.').collect();
        for (i, segment) in segments.iter().enumerate() {
            if segment.is_empty() {
                return Err(KernelError::exec(format!("bad location '{}'", location)));
            }
            let map = match current {
                Value::Object(map) => map,
                _ => return Err(KernelError::exec(format!("'{}' is not an object", location))),
            };
            if i + 1 == segments.len() {
                map.insert(segment.to_string(), value);
                return Ok(());
            }
            current = map
                .entry(segment.to_string())
                .or_insert_with(|| Value::Object(Default::default()));
        }
        Ok(())
    }

    /// Sets a plain datamodel variable (foreach item/index, data ids).
    fn set_var(&mut self, name: &str, value: Value) -> Result<(), KernelError> {
        match &mut self.data {
            Value::Object(map) => {
                map.insert(name.to_string(), value);
                Ok(())
            }
            _ => Err(KernelError::exec("datamodel is not an object")),
        }
    }

    /// Builds the payload of a done event or send from content, a
    /// content expression, or params.
    fn build_payload(
        &self,
        content: Option<&str>,
        contentexpr: Option<&str>,
        params: &[ElemParam],
    ) -> Value {
        if let Some(expr) = contentexpr {
            return self.eval_expr(expr);
        }
        if let Some(text) = content {
            return serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()));
        }
        if params.is_empty() {
            return Value::Null;
        }
        let mut map = serde_json::Map::new();
        for param in params {
            let value = match (&param.expr, &param.location) {
                (Some(expr), _) => self.eval_expr(expr),
                (None, Some(location)) => self.scope().lookup(location),
                (None, None) => Value::Null,
            };
            map.insert(param.name.clone(), value);
        }
        Value::Object(map)
    }

    fn state_label(state: &StateDesc) -> String {
        state
            .name
            .clone()
            .unwrap_or_else(|| format!("#{}", state.idx))
    }
}

impl Host for SimHost {
    type Event = Event;

    fn dequeue_internal(&mut self) -> Option<Event> {
        self.internal.pop_front()
    }

    fn dequeue_external(&mut self) -> Option<Event> {
        self.external.pop_front()
    }

    fn event_selected(&mut self, event: Option<&Event>) {
        self.current = event.cloned();
    }

    fn is_enabled(
        &mut self,
        transition: &TransDesc,
        event: Option<&Event>,
    ) -> Result<bool, KernelError> {
        let matched = match (event, transition.event.as_deref()) {
            // Event-less passes enable only spontaneous transitions.
            (None, _) => transition.flags.is_spontaneous(),
            (Some(event), Some(descriptor)) => descriptor_matches(descriptor, &event.name),
            (Some(_), None) => false,
        };
        if !matched {
            return Ok(false);
        }
        match transition.condition.as_deref() {
            None => Ok(true),
            Some(cond) => {
                // Guards read the event under trial, not the previously
                // selected one.
                let scope = Scope {
                    data: &self.data,
                    event,
                };
                let guard = GuardExpr::parse(cond)
                    .map_err(|err| KernelError::exec(format!("guard '{}': {}", cond, err)))?;
                Ok(guard.eval(scope))
            }
        }
    }

    fn raise_done_event(
        &mut self,
        state: &StateDesc,
        donedata: Option<&ElemDoneData>,
    ) -> Result<(), KernelError> {
        let name = format!("done.state.{}", Self::state_label(state));
        let payload = match donedata {
            Some(dd) => self.build_payload(dd.content.as_deref(), dd.contentexpr.as_deref(), &dd.params),
            None => Value::Null,
        };
        self.trace.push(TraceEntry::DoneEvent { event: name.clone() });
        self.internal.push_back(Event::with_data(name, payload));
        Ok(())
    }

    fn invoke(
        &mut self,
        state: &StateDesc,
        invocation: &ElemInvoke,
        uninvoke: bool,
    ) -> Result<(), KernelError> {
        self.trace.push(TraceEntry::Invoke {
            state: Self::state_label(state),
            id: invocation.id.clone(),
            machine: invocation.machine,
            uninvoke,
        });
        Ok(())
    }

    fn is_true(&mut self, expr: &str) -> Result<bool, KernelError> {
        self.eval_cond(expr)
    }

    fn exec_content_log(
        &mut self,
        label: Option<&str>,
        expr: Option<&str>,
    ) -> Result<(), KernelError> {
        let value = expr.map(|e| self.eval_expr(e)).unwrap_or(Value::Null);
        tracing::info!(label = label.unwrap_or(""), %value, "chart log");
        self.trace.push(TraceEntry::Log {
            label: label.map(str::to_string),
            value,
        });
        Ok(())
    }

    fn exec_content_raise(&mut self, event: &str) -> Result<(), KernelError> {
        self.trace.push(TraceEntry::Raise {
            event: event.to_string(),
        });
        self.internal.push_back(Event::new(event));
        Ok(())
    }

    fn exec_content_send(&mut self, send: &ElemSend) -> Result<(), KernelError> {
        let name = match (&send.event, &send.eventexpr) {
            (Some(event), _) => event.clone(),
            (None, Some(expr)) => match self.eval_expr(expr) {
                Value::String(s) => s,
                other => other.to_string(),
            },
            (None, None) => return Err(KernelError::exec("send without event or eventexpr")),
        };
        let target = match (&send.target, &send.targetexpr) {
            (Some(target), _) => Some(target.clone()),
            (None, Some(expr)) => match self.eval_expr(expr) {
                Value::String(s) => Some(s),
                Value::Null => None,
                other => Some(other.to_string()),
            },
            (None, None) => None,
        };
        let payload = self.build_payload(
            send.content.as_deref(),
            send.contentexpr.as_deref(),
            &send.params,
        );

        self.trace.push(TraceEntry::Send {
            event: Some(name.clone()),
            target: target.clone(),
            delay: send.delay.clone(),
        });

        // Delays are out of scope here; delivery is immediate. Without a
        // target the event goes back to the machine's external queue.
        let event = Event::with_data(name, payload);
        match target.as_deref() {
            Some(TARGET_INTERNAL) => self.internal.push_back(event),
            _ => self.external.push_back(event),
        }
        Ok(())
    }

    fn exec_content_cancel(
        &mut self,
        sendid: Option<&str>,
        sendidexpr: Option<&str>,
    ) -> Result<(), KernelError> {
        let sendid = match (sendid, sendidexpr) {
            (Some(id), _) => Some(id.to_string()),
            (None, Some(expr)) => match self.eval_expr(expr) {
                Value::String(s) => Some(s),
                _ => None,
            },
            (None, None) => None,
        };
        self.trace.push(TraceEntry::Cancel { sendid });
        Ok(())
    }

    fn exec_content_assign(
        &mut self,
        location: &str,
        expr: Option<&str>,
    ) -> Result<(), KernelError> {
        let value = expr.map(|e| self.eval_expr(e)).unwrap_or(Value::Null);
        self.set_path(location, value.clone())?;
        self.trace.push(TraceEntry::Assign {
            location: location.to_string(),
            value,
        });
        Ok(())
    }

    fn exec_content_script(
        &mut self,
        src: Option<&str>,
        _content: Option<&str>,
    ) -> Result<(), KernelError> {
        // No script engine here; the run is recorded and that is all.
        self.trace.push(TraceEntry::Script {
            src: src.map(str::to_string),
        });
        Ok(())
    }

    fn exec_content_init(&mut self, data: &ElemData) -> Result<(), KernelError> {
        let value = match (&data.expr, &data.content) {
            (Some(expr), _) => self.eval_expr(expr),
            (None, Some(text)) => {
                serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.clone()))
            }
            (None, None) => Value::Null,
        };
        self.set_var(&data.id, value.clone())?;
        self.trace.push(TraceEntry::DataInit {
            id: data.id.clone(),
            value,
        });
        Ok(())
    }

    fn exec_content_foreach_init(&mut self, foreach: &ElemForeach) -> Result<(), KernelError> {
        let items = match self.eval_expr(&foreach.array) {
            Value::Array(items) => items,
            other => {
                return Err(KernelError::exec(format!(
                    "foreach array '{}' is {}, not an array",
                    foreach.array, other
                )))
            }
        };
        self.frames.push(ForeachFrame { items, pos: 0 });
        Ok(())
    }

    fn exec_content_foreach_next(&mut self, foreach: &ElemForeach) -> Result<bool, KernelError> {
        let frame = self
            .frames
            .last_mut()
            .ok_or_else(|| KernelError::exec("foreach_next without foreach_init"))?;
        if frame.pos >= frame.items.len() {
            return Ok(false);
        }
        let item = frame.items[frame.pos].clone();
        let pos = frame.pos;
        frame.pos += 1;
        self.set_var(&foreach.item, item)?;
        if let Some(index) = &foreach.index {
            let index = index.clone();
            self.set_var(&index, Value::from(pos))?;
        }
        Ok(true)
    }

    fn exec_content_foreach_done(&mut self, _foreach: &ElemForeach) -> Result<(), KernelError> {
        self.frames
            .pop()
            .ok_or_else(|| KernelError::exec("foreach_done without foreach_init"))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rscxml_tables::TransFlags;
    use serde_json::json;

    fn transition(event: Option<&str>, cond: Option<&str>, spontaneous: bool) -> TransDesc {
        TransDesc {
            idx: 0,
            source: 0,
            target: rscxml_tables::BitSet::with_capacity(1),
            event: event.map(str::to_string),
            condition: cond.map(str::to_string),
            on_transition: None,
            flags: TransFlags(if spontaneous { 0x01 } else { 0 }),
            conflicts: rscxml_tables::BitSet::with_capacity(1),
            exit_set: rscxml_tables::BitSet::with_capacity(1),
        }
    }

    #[test]
    fn test_is_enabled_event_matching() {
        let mut host = SimHost::new();
        let t = transition(Some("door"), None, false);

        let event = Event::new("door.open");
        assert!(host.is_enabled(&t, Some(&event)).unwrap());
        assert!(!host.is_enabled(&t, None).unwrap());

        let other = Event::new("window.open");
        assert!(!host.is_enabled(&t, Some(&other)).unwrap());
    }

    #[test]
    fn test_is_enabled_spontaneous() {
        let mut host = SimHost::new();
        let spontaneous = transition(None, None, true);
        assert!(host.is_enabled(&spontaneous, None).unwrap());
        assert!(!host
            .is_enabled(&spontaneous, Some(&Event::new("any")))
            .unwrap());
    }

    #[test]
    fn test_is_enabled_guard_reads_event_under_trial() {
        let mut host = SimHost::new();
        let t = transition(Some("pay"), Some("_event.data.amount > 10"), false);

        let small = Event::with_data("pay", json!({"amount": 5}));
        let large = Event::with_data("pay", json!({"amount": 50}));
        assert!(!host.is_enabled(&t, Some(&small)).unwrap());
        assert!(host.is_enabled(&t, Some(&large)).unwrap());
    }

    #[test]
    fn test_bad_guard_is_an_error() {
        let mut host = SimHost::new();
        let t = transition(Some("e"), Some("nonsense"), false);
        assert!(host.is_enabled(&t, Some(&Event::new("e"))).is_err());
    }

    #[test]
    fn test_assign_creates_nested_objects() {
        let mut host = SimHost::new();
        host.exec_content_assign("ctx.order.total", Some("42")).unwrap();
        assert_eq!(host.data()["order"]["total"], json!(42));

        assert!(host.exec_content_assign("total", Some("1")).is_err());
    }

    #[test]
    fn test_eval_expr_forms() {
        let host = SimHost::new().with_data(json!({"n": 7}));
        assert_eq!(host.eval_expr("3"), json!(3));
        assert_eq!(host.eval_expr("\"hi\""), json!("hi"));
        assert_eq!(host.eval_expr("[1, 2]"), json!([1, 2]));
        assert_eq!(host.eval_expr("ctx.n"), json!(7));
        assert_eq!(host.eval_expr("plain text"), json!("plain text"));
    }

    #[test]
    fn test_raise_and_send_routing() {
        let mut host = SimHost::new();
        host.exec_content_raise("tick").unwrap();
        assert_eq!(host.internal.len(), 1);

        host.exec_content_send(&ElemSend {
            event: Some("loop".to_string()),
            target: Some("#_internal".to_string()),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(host.internal.len(), 2);

        host.exec_content_send(&ElemSend {
            event: Some("out".to_string()),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(host.external.len(), 1);

        assert!(host
            .exec_content_send(&ElemSend::default())
            .is_err());
    }

    #[test]
    fn test_send_payload_from_params() {
        let mut host = SimHost::new().with_data(json!({"total": 9}));
        host.exec_content_send(&ElemSend {
            event: Some("report".to_string()),
            params: vec![ElemParam {
                name: "sum".to_string(),
                expr: Some("ctx.total".to_string()),
                location: None,
            }],
            ..Default::default()
        })
        .unwrap();
        let event = host.external.pop_front().unwrap();
        assert_eq!(event.data, json!({"sum": 9}));
    }

    #[test]
    fn test_data_init() {
        let mut host = SimHost::new();
        host.exec_content_init(&ElemData {
            id: "count".to_string(),
            expr: Some("0".to_string()),
            ..Default::default()
        })
        .unwrap();
        host.exec_content_init(&ElemData {
            id: "tags".to_string(),
            content: Some("[\"a\", \"b\"]".to_string()),
            ..Default::default()
        })
        .unwrap();

        assert_eq!(host.data()["count"], json!(0));
        assert_eq!(host.data()["tags"], json!(["a", "b"]));
    }

    #[test]
    fn test_foreach_protocol() {
        let mut host = SimHost::new().with_data(json!({"items": [10, 20, 30]}));
        let foreach = ElemForeach {
            array: "ctx.items".to_string(),
            item: "it".to_string(),
            index: Some("i".to_string()),
        };

        host.exec_content_foreach_init(&foreach).unwrap();
        let mut seen = Vec::new();
        while host.exec_content_foreach_next(&foreach).unwrap() {
            seen.push((host.data()["it"].clone(), host.data()["i"].clone()));
        }
        host.exec_content_foreach_done(&foreach).unwrap();

        assert_eq!(
            seen,
            vec![
                (json!(10), json!(0)),
                (json!(20), json!(1)),
                (json!(30), json!(2))
            ]
        );

        // Over a non-array the loop refuses to start.
        let bad = ElemForeach {
            array: "ctx.missing".to_string(),
            item: "it".to_string(),
            index: None,
        };
        assert!(host.exec_content_foreach_init(&bad).is_err());
    }

    #[test]
    fn test_done_event_payload() {
        let mut host = SimHost::new().with_data(json!({"result": "ok"}));
        let state = StateDesc {
            idx: 3,
            parent: 0,
            kind: rscxml_tables::StateKind::Compound,
            has_history: false,
            name: Some("job".to_string()),
            children: rscxml_tables::BitSet::with_capacity(4),
            completion: rscxml_tables::BitSet::with_capacity(4),
            ancestors: rscxml_tables::BitSet::with_capacity(4),
            data: None,
            on_entry: None,
            on_exit: None,
            invoke: None,
        };
        let dd = ElemDoneData {
            source: 2,
            content: None,
            contentexpr: Some("ctx.result".to_string()),
            params: vec![],
        };

        host.raise_done_event(&state, Some(&dd)).unwrap();
        let event = host.internal.pop_front().unwrap();
        assert_eq!(event.name, "done.state.job");
        assert_eq!(event.data, json!("ok"));
    }
}
