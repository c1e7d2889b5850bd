use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};
use syn::{parse_macro_input, spanned::Spanned, FnArg, Ident, ItemFn, Pat, Signature, Type};

/// Transform an asynchronous test into a synchronous one and inject dependencies.
///
/// By default the test runs against an in-memory store. With
/// `#[backend_test(mongodb)]` it runs against a fresh database on the server
/// named by `ELECTION_TEST_DB_URI`, which is dropped regardless of how the
/// test terminates; such tests are ignored unless explicitly requested.
///
/// Injectable dependencies are [`rocket::local::asynchronous::Client`] and
/// `crate::clock::ManualClock` in both modes, plus [`mongodb::Database`] and
/// `crate::store::MongoStore` in `mongodb` mode.
#[proc_macro_attribute]
pub fn backend_test(args: TokenStream, input: TokenStream) -> TokenStream {
    let mut item_fn = parse_macro_input!(input as ItemFn);

    // Work out which store to test against.
    let mongodb = match parse_macro_input!(args as Option<Ident>) {
        None => false,
        Some(arg) if arg == "mongodb" => true,
        Some(arg) => {
            return syn::Error::new(arg.span(), "Expected `mongodb` or no argument")
                .into_compile_error()
                .into();
        }
    };

    // Extract type information and reject invalid function signatures.
    let test_args = match check_sig(item_fn.sig.clone(), mongodb) {
        Ok(args) => args,
        Err(err) => {
            return err.into_compile_error().into();
        }
    };

    // Rename the future so the test can have its original name.
    let name = item_fn.sig.ident.clone();
    let new_name = format_ident!("{}_fut", name);
    item_fn.sig.ident = new_name.clone();

    let (maybe_ignore, setup, cleanup) = if mongodb {
        (
            quote! { #[ignore = "needs a MongoDB replica set at ELECTION_TEST_DB_URI"] },
            quote! {
                let db_uri = std::env::var("ELECTION_TEST_DB_URI")
                    .expect("ELECTION_TEST_DB_URI must be set for MongoDB tests");
                let db_client = mongodb::Client::with_uri_str(&db_uri).await.unwrap();
                // Use a random name to avoid collisions between tests.
                let db_name = format!("test{}", rand::random::<u32>());
                log::info!("Using database {db_name}");
                let store = crate::store::MongoStore::connect(db_client.clone(), &db_name)
                    .await
                    .unwrap();
                let db = Some(db_client.database(&db_name));
                let registry = crate::registry::Registry::new(
                    Box::new(store.clone()),
                    std::sync::Arc::new(clock.clone()),
                    config.owner().clone(),
                );
                let store = Some(store);
            },
            quote! {
                if let Some(db) = db {
                    db.drop(None).await.unwrap();
                }
            },
        )
    } else {
        (
            quote! {},
            quote! {
                let db: Option<mongodb::Database> = None;
                let store: Option<crate::store::MongoStore> = None;
                let registry = crate::registry::Registry::in_memory(
                    std::sync::Arc::new(clock.clone()),
                    config.owner().clone(),
                );
            },
            quote! {
                let _ = db;
            },
        )
    };

    // Rewrite the test function.
    quote! {
        #[test]
        #maybe_ignore
        #[allow(unused_variables)]
        fn #name() {
            /// Test setup.
            async fn setup() -> (
                rocket::local::asynchronous::Client,
                crate::clock::ManualClock,
                Option<mongodb::Database>,
                Option<crate::store::MongoStore>,
            ) {
                log4rs_test_utils::test_logging::init_logging_once_for(
                    ["election_manager"],
                    None,
                    None,
                );
                let config = crate::config::Config::example();
                let clock = crate::clock::ManualClock::example();

                #setup

                let rocket_client = rocket::local::asynchronous::Client::tracked(
                    crate::rocket_for_registry(config, registry),
                )
                .await
                .unwrap();

                (rocket_client, clock, db, store)
            }

            /// The test itself.
            #item_fn

            /// Test cleanup.
            async fn cleanup(db: Option<mongodb::Database>) {
                #cleanup
            }

            // Create an async runtime. We need a separate one for inside and
            // outside the `catch_unwind`.
            let outer_runtime = rocket::tokio::runtime::Builder::new_multi_thread()
                .thread_name("test-setup-cleanup")
                .worker_threads(1)
                .enable_all()
                .build()
                .unwrap();
            let inner_runtime = rocket::tokio::runtime::Builder::new_multi_thread()
                .thread_name("rocket-worker-test-thread")
                .worker_threads(1)
                .enable_all()
                .build()
                .unwrap();

            // Run the setup.
            let (rocket_client, clock, db, store) = outer_runtime.block_on(setup());

            // Run the test, catching any panics.
            // Use mutexes to safely transfer `!UnwindSafe` data.
            let client_mutex = std::sync::Mutex::new(rocket_client);
            let clock_mutex = std::sync::Mutex::new(clock);
            let db_mutex = std::sync::Mutex::new(db.clone());
            let store_mutex = std::sync::Mutex::new(store);
            let runtime_mutex = std::sync::Mutex::new(inner_runtime);
            let result = std::panic::catch_unwind(|| {
                let rocket_client = client_mutex.into_inner().unwrap();
                let clock = clock_mutex.into_inner().unwrap();
                let db = db_mutex.into_inner().unwrap();
                let store = store_mutex.into_inner().unwrap();
                let runtime = runtime_mutex.into_inner().unwrap();

                runtime.block_on(#new_name(#(#test_args),*));
            });

            // Run the cleanup.
            outer_runtime.block_on(cleanup(db));

            // If the test panicked, re-raise the panic.
            if let Err(cause) = result {
                std::panic::panic_any(cause);
            }
        }
    }
    .into()
}

/// Ensure the wrapped test is async, extract parameters to inject, and reject unknown parameters.
fn check_sig(sig: Signature, mongodb: bool) -> Result<Vec<TokenStream2>, syn::Error> {
    if sig.asyncness.is_none() {
        return Err(syn::Error::new(sig.span(), "Test must be marked `async`"));
    }

    let mut seen: Vec<String> = vec![];
    let mut args = vec![];

    for input in &sig.inputs {
        if let FnArg::Typed(pat_type) = input {
            if let (Pat::Ident(_), Type::Path(type_path)) = (&*pat_type.pat, &*pat_type.ty) {
                if let Some(type_ident) = type_path.path.get_ident() {
                    let type_name = type_ident.to_string();
                    let arg = match type_name.as_str() {
                        "Client" => quote! { rocket_client },
                        "ManualClock" => quote! { clock },
                        "Database" if mongodb => quote! { db.unwrap() },
                        "MongoStore" if mongodb => quote! { store.unwrap() },
                        "Database" | "MongoStore" => {
                            return Err(syn::Error::new(
                                input.span(),
                                format!("`{type_name}` can only be injected into `#[backend_test(mongodb)]` tests"),
                            ));
                        }
                        _ => {
                            return Err(syn::Error::new(
                                input.span(),
                                "Expected one of `Client`, `ManualClock`, `Database` or `MongoStore`",
                            ));
                        }
                    };
                    if seen.contains(&type_name) {
                        return Err(syn::Error::new(
                            input.span(),
                            format!("Test cannot accept more than one `{type_name}`"),
                        ));
                    }
                    seen.push(type_name);
                    args.push(arg);
                    continue;
                }
            }
        }

        return Err(syn::Error::new(
            input.span(),
            "Expected one of `client_ident: Client`, `clock_ident: ManualClock`, `db_ident: Database` or `store_ident: MongoStore`",
        ));
    }

    Ok(args)
}
