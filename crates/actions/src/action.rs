use std::{fmt, future::Future, sync::Arc};

use {
    async_trait::async_trait,
    serde::{Deserialize, Serialize},
};

use crate::{Error, Result, reply::Reply};

/// What a handler hands back: `Some(text)` becomes the final reply.
pub type ActionResult = anyhow::Result<Option<String>>;

/// One positional parameter of an action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    #[serde(default)]
    pub optional: bool,
}

impl Parameter {
    pub fn required(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            optional: false,
        }
    }

    pub fn optional(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            optional: true,
        }
    }
}

/// Everything a handler gets for one dispatch.
#[derive(Clone)]
pub struct Invocation {
    /// Identity of the user who issued the command.
    pub user: String,
    /// Sends messages back to that user.
    pub reply: Reply,
    /// Positional arguments, including the trailing remainder token.
    pub args: Vec<String>,
}

impl Invocation {
    /// Argument at `index`, if present.
    #[must_use]
    pub fn arg(&self, index: usize) -> Option<&str> {
        self.args.get(index).map(String::as_str)
    }
}

/// The code behind an action.
#[async_trait]
pub trait ActionHandler: Send + Sync {
    async fn call(&self, invocation: Invocation) -> ActionResult;
}

#[async_trait]
impl<F, Fut> ActionHandler for F
where
    F: Fn(Invocation) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ActionResult> + Send + 'static,
{
    async fn call(&self, invocation: Invocation) -> ActionResult {
        (self)(invocation).await
    }
}

/// A caller-owned action definition, validated when registered.
#[derive(Clone, Default)]
pub struct ActionDef {
    pub name: String,
    pub description: Option<String>,
    pub parameters: Vec<Parameter>,
    pub handler: Option<Arc<dyn ActionHandler>>,
}

impl ActionDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn param(mut self, name: impl Into<String>) -> Self {
        self.parameters.push(Parameter::required(name));
        self
    }

    #[must_use]
    pub fn optional_param(mut self, name: impl Into<String>) -> Self {
        self.parameters.push(Parameter::optional(name));
        self
    }

    #[must_use]
    pub fn handler(mut self, handler: impl ActionHandler + 'static) -> Self {
        self.handler = Some(Arc::new(handler));
        self
    }
}

impl fmt::Debug for ActionDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionDef")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("parameters", &self.parameters)
            .field("handler", &self.handler.as_ref().map(|_| "<handler>"))
            .finish()
    }
}

/// A validated, registered action. Immutable once built.
pub struct Action {
    name: String,
    description: Option<String>,
    parameters: Vec<Parameter>,
    min_arity: usize,
    handler: Arc<dyn ActionHandler>,
}

impl Action {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    /// Number of required parameters.
    pub fn min_arity(&self) -> usize {
        self.min_arity
    }

    pub(crate) fn handler(&self) -> &Arc<dyn ActionHandler> {
        &self.handler
    }

    /// Help block: `` `name` `x` `[y]` `` plus the description on its own line.
    #[must_use]
    pub fn help_block(&self) -> String {
        let mut block = format!("`{}`", self.name);
        for param in &self.parameters {
            if param.optional {
                block.push_str(&format!(" `[{}]`", param.name));
            } else {
                block.push_str(&format!(" `{}`", param.name));
            }
        }
        if let Some(description) = &self.description {
            block.push('\n');
            block.push_str(description);
        }
        block
    }
}

impl TryFrom<&ActionDef> for Action {
    type Error = Error;

    fn try_from(def: &ActionDef) -> Result<Self> {
        if def.name.is_empty() {
            return Err(Error::validation("A name for the action needs to be provided"));
        }

        let mut seen_optional = false;
        let mut min_arity = 0;
        for param in &def.parameters {
            if seen_optional && !param.optional {
                return Err(Error::validation(format!(
                    "`{}`: required parameter `{}` must not follow an optional parameter",
                    def.name, param.name
                )));
            }
            if param.optional {
                seen_optional = true;
            } else {
                min_arity += 1;
            }
        }

        let handler = def.handler.clone().ok_or_else(|| {
            Error::validation(format!("`{}`: the action needs a handler", def.name))
        })?;

        Ok(Self {
            name: def.name.clone(),
            description: def.description.clone(),
            parameters: def.parameters.clone(),
            min_arity,
            handler,
        })
    }
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Action")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("parameters", &self.parameters)
            .field("min_arity", &self.min_arity)
            .finish_non_exhaustive()
    }
}
