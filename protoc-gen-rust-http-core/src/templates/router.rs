use strfmt::strfmt;

use super::render_module_footer;
use super::render_module_header;
use super::render_service_adapter;
use super::template_error;
use super::FileInput;
use super::ServiceInput;
use crate::error::Result;

const ROUTER_OPTIONS: &str = r#"
    /// Options shared by the routers of this file.
    #[derive(Clone, Default)]
    pub struct RouterOptions {
        routes: ::std::collections::HashMap<
            ::std::string::String,
            ::std::option::Option<::protoc_gen_rust_http_codec::Handler>,
        >,
        with_swagger: bool,
    }

    impl RouterOptions {
        pub fn new() -> Self {
            Self::default()
        }

        /// Sets handlers to specific routes.
        /// Set the handler to `None` to delete a route.
        pub fn with_routes(
            mut self,
            routes: ::std::collections::HashMap<
                ::std::string::String,
                ::std::option::Option<::protoc_gen_rust_http_codec::Handler>,
            >,
        ) -> Self {
            self.routes.extend(routes);
            self
        }

        /// Reserved. Swagger documentation is not served yet.
        pub fn with_swagger(mut self) -> Self {
            self.with_swagger = true;
            self
        }

        fn validate(&self) -> ::std::result::Result<(), ::protoc_gen_rust_http_codec::CodecError> {
            match self.routes.keys().find(|route| !route.starts_with('/')) {
                Some(route) => Err(::protoc_gen_rust_http_codec::CodecError::InvalidRoutes(
                    route.clone(),
                )),
                None => Ok(()),
            }
        }
    }
"#;

const ROUTER_HEADER: &str = r#"
    /// Dispatches HTTP requests to the `{service}` handlers by codec route.
    pub struct {router}<C> {{
        codec: ::std::sync::Arc<C>,
        routes: ::std::collections::HashMap<
            ::std::string::String,
            ::protoc_gen_rust_http_codec::Handler,
        >,
    }}

    impl<C> {router}<C>
    where
        C: ::protoc_gen_rust_http_codec::Codec,
    {{
        pub fn new<S>(
            srv: S,
            codec: C,
            options: RouterOptions,
        ) -> ::std::result::Result<Self, ::protoc_gen_rust_http_codec::CodecError>
        where
            S: {server_module}::{trait_name},
        {{
            options.validate()?;

            let codec = ::std::sync::Arc::new(codec);
            let srv = ::std::sync::Arc::new({adapter}::from_arc(
                ::std::sync::Arc::new(srv),
                ::std::sync::Arc::clone(&codec),
            ));

            let mut routes: ::std::collections::HashMap<
                ::std::string::String,
                ::protoc_gen_rust_http_codec::Handler,
            > = ::std::collections::HashMap::new();
"#;
const ROUTER_ROUTE: &str = r#"
            {{
                let srv = ::std::sync::Arc::clone(&srv);
                let handler: ::protoc_gen_rust_http_codec::Handler = ::std::sync::Arc::new(
                    move |req: ::protoc_gen_rust_http_codec::Request| -> ::protoc_gen_rust_http_codec::HandlerFuture {{
                        let srv = ::std::sync::Arc::clone(&srv);
                        ::std::boxed::Box::pin(async move {{ srv.{fn_name}(req).await }})
                    }},
                );
                routes.insert("{route}".to_string(), handler);
            }}
"#;
const ROUTER_FOOTER: &str = r#"
            for (route, handler) in options.routes {
                match handler {
                    Some(handler) => {
                        routes.insert(route, handler);
                    }
                    None => {
                        routes.remove(&route);
                    }
                }
            }

            Ok(Self { codec, routes })
        }

        /// The served routes, sorted.
        pub fn routes(&self) -> ::std::vec::Vec<&str> {
            let mut routes: ::std::vec::Vec<&str> =
                self.routes.keys().map(|route| route.as_str()).collect();
            routes.sort_unstable();
            routes
        }

        pub async fn serve(
            &self,
            req: ::protoc_gen_rust_http_codec::Request,
        ) -> ::protoc_gen_rust_http_codec::Response {
            let route = match self.codec.route(&req) {
                Ok(route) => route,
                Err(err) => return self.error_response(&err),
            };
            match self.routes.get(&route) {
                Some(handler) => handler(req).await,
                None => self.error_response(&::protoc_gen_rust_http_codec::CodecError::NoRoute(route)),
            }
        }

        fn error_response(
            &self,
            err: &(dyn ::std::error::Error + 'static),
        ) -> ::protoc_gen_rust_http_codec::Response {
            let mut resp = ::protoc_gen_rust_http_codec::Response::default();
            let _ = self.codec.write_error(&mut resp, err);
            resp
        }
    }
"#;

/// Renders the router file: the router options, then per service a private
/// handler struct and the router wrapping it.
pub fn render(input: &FileInput) -> Result<String> {
    let module = format!("{}_router", input.module);

    let mut out = render_module_header(input, &module)?;
    out += ROUTER_OPTIONS;
    for service in &input.services {
        out += &render_service_adapter(input, service, false)?;
        out += &render_router(input, service)?;
    }
    out += &render_module_footer(input, &module)?;
    Ok(out)
}

fn render_router(input: &FileInput, service: &ServiceInput) -> Result<String> {
    let mut out = strfmt!(
        ROUTER_HEADER,
        service => service.name.clone(),
        router => service.router_type(),
        adapter => service.adapter_type(),
        server_module => service.server_module.clone(),
        trait_name => service.trait_name.clone()
    )
    .map_err(|e| template_error(&input.source, e))?;

    for handler in &service.handlers {
        out += &strfmt!(
            ROUTER_ROUTE,
            fn_name => handler.fn_name.clone(),
            route => handler.route.clone()
        )
        .map_err(|e| template_error(&input.source, e))?;
    }

    out += ROUTER_FOOTER;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::templates::tests::assert_contains;
    use crate::templates::tests::input;

    #[test]
    fn parses() {
        let out = render(&input(true)).unwrap();
        syn::parse_file(&out).unwrap();
    }

    #[test]
    fn layout() {
        let out = render(&input(false)).unwrap();
        assert_contains(&out, "pub mod example_pb_http_router {");
        assert_contains(&out, "pub struct RouterOptions");
        assert_contains(&out, "pub fn with_swagger(mut self) -> Self");
        assert_contains(&out, "struct HttpExampleServer<S, C>");
        assert_contains(&out, "pub struct ExampleRouter<C>");
        assert_contains(&out, "pub use self::example_pb_http_router::*;");
        assert!(!out.contains("pub struct HttpExampleServer"));
    }

    #[test]
    fn default_routes() {
        let out = render(&input(false)).unwrap();
        assert_contains(&out, r#"routes.insert("/example/getperson".to_string(), handler);"#);
        assert_contains(&out, r#"routes.insert("/example/search".to_string(), handler);"#);
        assert_contains(&out, "srv.get_person(req).await");
    }

    #[test]
    fn options_once_per_file() {
        let mut input = input(false);
        let mut second = input.services[0].clone();
        second.name = "Other".to_string();
        second.trait_name = "Other".to_string();
        second.server_module = "other_server".to_string();
        input.services.push(second);

        let out = render(&input).unwrap();
        assert_eq!(1, out.matches("pub struct RouterOptions").count());
        assert_contains(&out, "pub struct OtherRouter<C>");
        syn::parse_file(&out).unwrap();
    }
}
