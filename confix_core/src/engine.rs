use crate::ConfixResult;
use crate::EnvironmentFilter;
use crate::FileReferenceFilter;
use crate::Filter;
use crate::FilterRegistry;
use crate::ProcessEnvironment;
use crate::Scalar;
use crate::VariableSource;
use crate::parser::Expression;
use crate::parser::parse_template;

/// Resolves `${…}` expressions in strings.
///
/// The engine owns the filter registry and the variable source that the
/// leading name of every expression is looked up in. It is built once and
/// then only read.
pub struct TemplateEngine {
	registry: FilterRegistry,
	variables: Box<dyn VariableSource>,
}

impl std::fmt::Debug for TemplateEngine {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("TemplateEngine")
			.field("registry", &self.registry)
			.finish_non_exhaustive()
	}
}

impl Default for TemplateEngine {
	fn default() -> Self {
		Self::new(FilterRegistry::with_builtins())
	}
}

impl TemplateEngine {
	/// An engine reading variables from the process environment.
	pub fn new(registry: FilterRegistry) -> Self {
		Self {
			registry,
			variables: Box::new(ProcessEnvironment),
		}
	}

	/// Replace the variable source.
	#[must_use]
	pub fn with_variables(mut self, variables: impl VariableSource + 'static) -> Self {
		self.variables = Box::new(variables);
		self
	}

	pub fn registry(&self) -> &FilterRegistry {
		&self.registry
	}

	/// Render every expression in `input`.
	///
	/// When `input` is exactly one expression the chain result is returned
	/// with its type intact. Otherwise each result is converted to its string
	/// form and spliced into the surrounding text. Input without expressions
	/// is returned unchanged.
	pub fn render(&self, input: &str) -> ConfixResult<Scalar> {
		let expressions = parse_template(input)?;

		if expressions.is_empty() {
			return Ok(Scalar::String(input.to_string()));
		}

		if let [expression] = expressions.as_slice() {
			if expression.is_whole(input) {
				return self.evaluate(expression);
			}
		}

		let mut output = String::with_capacity(input.len());
		let mut last = 0;

		for expression in &expressions {
			let value = self.evaluate(expression)?.into_string();
			output.push_str(&input[last..expression.span.start]);
			output.push_str(&value);
			last = expression.span.end;
		}

		output.push_str(&input[last..]);

		Ok(Scalar::String(output))
	}

	/// Run the filter chain of a single expression.
	pub fn evaluate(&self, expression: &Expression) -> ConfixResult<Scalar> {
		let mut value = Scalar::String(String::new());

		for filter in self.build_chain(expression) {
			value = filter.process(value)?;
		}

		tracing::debug!(
			source = %expression.source,
			filters = expression.filters.len(),
			result_type = value.type_name(),
			"resolved expression"
		);

		Ok(value)
	}

	/// The variable lookup and file dereference always run first, followed by
	/// the named filters in order.
	fn build_chain(&self, expression: &Expression) -> Vec<Box<dyn Filter + '_>> {
		let mut chain: Vec<Box<dyn Filter + '_>> = Vec::with_capacity(expression.filters.len() + 2);
		chain.push(Box::new(EnvironmentFilter::new(
			expression.source.as_str(),
			self.variables.as_ref(),
		)));
		chain.push(Box::new(FileReferenceFilter));

		for call in &expression.filters {
			chain.push(self.registry.instantiate(&call.name, &call.params));
		}

		chain
	}
}
