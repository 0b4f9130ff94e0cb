use proc_macro::TokenStream;
use quote::quote;
use syn::parse_macro_input;

/// Declares a stateless retrieval tool.
///
/// Expands to a unit struct named after the tool (`fetch_page` becomes
/// `FetchPage`) implementing `tiny_crew_rs::tools::Tool`. The parameter
/// schema comes from `schemars::schema_for!` on `params`, and the closure
/// receives the deserialized parameters and returns
/// `Result<serde_json::Value, tiny_crew_rs::CrewError>`.
#[proc_macro]
pub fn tool(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as ToolDefinition);

    let name = input.name;
    let description = input.description;
    let params_type = input.params_type;
    let execute_body = input.execute_body;

    let struct_name = pascal_case(&name.value());
    let tool_struct = quote::format_ident!("{}", struct_name);

    let expanded = quote! {
        #[derive(Debug, Clone, Copy, Default)]
        pub struct #tool_struct;

        impl tiny_crew_rs::tools::Tool for #tool_struct {
            fn name(&self) -> &'static str {
                #name
            }

            fn description(&self) -> &'static str {
                #description
            }

            fn parameters_schema(&self) -> serde_json::Value {
                let schema = schemars::schema_for!(#params_type);
                serde_json::to_value(&schema.schema).unwrap_or_else(|_| {
                    serde_json::json!({
                        "type": "object",
                        "properties": {},
                        "required": []
                    })
                })
            }

            fn execute(
                &self,
                parameters: serde_json::Value,
            ) -> std::pin::Pin<
                Box<
                    dyn std::future::Future<Output = Result<serde_json::Value, tiny_crew_rs::CrewError>>
                        + Send
                        + '_,
                >,
            > {
                Box::pin(async move {
                    let params: #params_type = serde_json::from_value(parameters)
                        .map_err(|e| tiny_crew_rs::CrewError::ToolExecution(
                            format!("Invalid parameters for {}: {}", #name, e)
                        ))?;

                    let handler = #execute_body;
                    handler(params).await
                })
            }
        }
    };

    TokenStream::from(expanded)
}

fn pascal_case(snake: &str) -> String {
    snake
        .split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}

struct ToolDefinition {
    name: syn::LitStr,
    description: syn::LitStr,
    params_type: syn::Type,
    execute_body: syn::ExprClosure,
}

fn parse_named_assignment<T: syn::parse::Parse>(
    input: syn::parse::ParseStream,
    keyword: &str,
) -> syn::Result<T> {
    let ident: syn::Ident = input.parse()?;
    if ident != keyword {
        return Err(syn::Error::new_spanned(
            ident,
            format!("expected '{keyword}'"),
        ));
    }
    input.parse::<syn::Token![=]>()?;
    let value = input.parse::<T>()?;
    input.parse::<syn::Token![,]>()?;
    Ok(value)
}

impl syn::parse::Parse for ToolDefinition {
    fn parse(input: syn::parse::ParseStream) -> syn::Result<Self> {
        let name = parse_named_assignment::<syn::LitStr>(input, "name")?;
        let description = parse_named_assignment::<syn::LitStr>(input, "description")?;
        let params_type = parse_named_assignment::<syn::Type>(input, "params")?;
        let execute_body: syn::ExprClosure = input.parse()?;
        // Allow a trailing comma after the closure.
        let _ = input.parse::<Option<syn::Token![,]>>()?;

        Ok(ToolDefinition {
            name,
            description,
            params_type,
            execute_body,
        })
    }
}
