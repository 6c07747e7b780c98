// ------- Member model --------

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoLocality {
    #[prost(string, tag = "1")]
    pub region: ::prost::alloc::string::String,
    #[prost(string, tag = "2")]
    pub availability_zone: ::prost::alloc::string::String,
}
/// Wrapper so an absent map can be told apart from an empty one.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoMetadata {
    #[prost(map = "string, string", tag = "1")]
    pub entries:
        ::std::collections::HashMap<::prost::alloc::string::String, ::prost::alloc::string::String>,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoMemberState {
    #[prost(string, tag = "1")]
    pub id: ::prost::alloc::string::String,
    #[prost(string, tag = "2")]
    pub service: ::prost::alloc::string::String,
    #[prost(string, tag = "3")]
    pub status: ::prost::alloc::string::String,
    #[prost(message, optional, tag = "4")]
    pub locality: ::core::option::Option<ProtoLocality>,
    #[prost(int64, tag = "5")]
    pub started: i64,
    #[prost(string, tag = "6")]
    pub revision: ::prost::alloc::string::String,
    #[prost(message, optional, tag = "7")]
    pub metadata: ::core::option::Option<ProtoMetadata>,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoVersionTimestamp {
    #[prost(int64, tag = "1")]
    pub timestamp: i64,
    #[prost(uint64, tag = "2")]
    pub counter: u64,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoVersion {
    #[prost(string, tag = "1")]
    pub owner_id: ::prost::alloc::string::String,
    #[prost(message, optional, tag = "2")]
    pub timestamp: ::core::option::Option<ProtoVersionTimestamp>,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoMember {
    #[prost(message, optional, tag = "1")]
    pub state: ::core::option::Option<ProtoMemberState>,
    #[prost(enumeration = "ProtoLiveness", tag = "2")]
    pub liveness: i32,
    #[prost(message, optional, tag = "3")]
    pub version: ::core::option::Option<ProtoVersion>,
    #[prost(int64, tag = "4")]
    pub expiry: i64,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoClientUpdate {
    #[prost(enumeration = "ProtoClientUpdateType", tag = "1")]
    pub update_type: i32,
    /// REGISTER only.
    #[prost(message, optional, tag = "2")]
    pub member: ::core::option::Option<ProtoMemberState>,
    /// Every message.
    #[prost(string, tag = "3")]
    pub client_id: ::prost::alloc::string::String,
    #[prost(uint64, tag = "4")]
    pub seq_id: u64,
    /// UPDATE_METADATA only.
    #[prost(string, tag = "5")]
    pub member_id: ::prost::alloc::string::String,
    #[prost(message, optional, tag = "6")]
    pub metadata: ::core::option::Option<ProtoMetadata>,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoClientAck {
    #[prost(uint64, tag = "1")]
    pub seq_id: u64,
    #[prost(enumeration = "ProtoClientErrorCode", tag = "2")]
    pub error: i32,
    #[prost(string, tag = "3")]
    pub message: ::prost::alloc::string::String,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoSubscribeRequest {
    #[prost(map = "string, message", tag = "1")]
    pub known_members: ::std::collections::HashMap<::prost::alloc::string::String, ProtoVersion>,
    #[prost(bool, tag = "2")]
    pub owner_only: bool,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoMemberRequest {
    #[prost(string, tag = "1")]
    pub id: ::prost::alloc::string::String,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoMemberResponse {
    #[prost(message, optional, tag = "1")]
    pub member: ::core::option::Option<ProtoMember>,
}
/// Empty
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoMembersRequest {}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoMembersResponse {
    #[prost(message, repeated, tag = "1")]
    pub members: ::prost::alloc::vec::Vec<ProtoMember>,
}
// ------- Replica to replica service --------

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoUpdateRequest {
    #[prost(message, optional, tag = "1")]
    pub member: ::core::option::Option<ProtoMember>,
    #[prost(string, tag = "2")]
    pub source_node_id: ::prost::alloc::string::String,
}
/// Empty
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoUpdateResponse {}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoDigestRequest {
    #[prost(map = "string, message", tag = "1")]
    pub entries: ::std::collections::HashMap<::prost::alloc::string::String, ProtoVersionTimestamp>,
    #[prost(string, tag = "2")]
    pub source_node_id: ::prost::alloc::string::String,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoDigestResponse {
    #[prost(message, repeated, tag = "1")]
    pub delta: ::prost::alloc::vec::Vec<ProtoMember>,
}
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum ProtoLiveness {
    Up = 0,
    Down = 1,
    Left = 2,
}
// ------- Client facing service --------

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum ProtoClientUpdateType {
    Register = 0,
    Heartbeat = 1,
    Unregister = 2,
    UpdateMetadata = 3,
}
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum ProtoClientErrorCode {
    NoError = 0,
    InvalidUpdate = 1,
    AlreadyRegistered = 2,
    NotRegistered = 3,
    ClockRegress = 4,
    Internal = 5,
}
#[doc = r" Generated client implementations."]
pub mod grpc_registry_client {
    #![allow(unused_variables, dead_code, missing_docs, clippy::let_unit_value)]
    use tonic::codegen::*;
    #[derive(Debug, Clone)]
    pub struct GrpcRegistryClient<T> {
        inner: tonic::client::Grpc<T>,
    }
    impl GrpcRegistryClient<tonic::transport::Channel> {
        #[doc = r" Attempt to create a new client by connecting to a given endpoint."]
        pub async fn connect<D>(dst: D) -> Result<Self, tonic::transport::Error>
        where
            D: std::convert::TryInto<tonic::transport::Endpoint>,
            D::Error: Into<StdError>,
        {
            let conn = tonic::transport::Endpoint::new(dst)?.connect().await?;
            Ok(Self::new(conn))
        }
    }
    impl<T> GrpcRegistryClient<T>
    where
        T: tonic::client::GrpcService<tonic::body::BoxBody>,
        T::ResponseBody: Body + Send + 'static,
        T::Error: Into<StdError>,
        <T::ResponseBody as Body>::Error: Into<StdError> + Send,
    {
        pub fn new(inner: T) -> Self {
            let inner = tonic::client::Grpc::new(inner);
            Self { inner }
        }
        pub fn with_interceptor<F>(
            inner: T,
            interceptor: F,
        ) -> GrpcRegistryClient<InterceptedService<T, F>>
        where
            F: tonic::service::Interceptor,
            T: tonic::codegen::Service<
                http::Request<tonic::body::BoxBody>,
                Response = http::Response<
                    <T as tonic::client::GrpcService<tonic::body::BoxBody>>::ResponseBody,
                >,
            >,
            <T as tonic::codegen::Service<http::Request<tonic::body::BoxBody>>>::Error:
                Into<StdError> + Send + Sync,
        {
            GrpcRegistryClient::new(InterceptedService::new(inner, interceptor))
        }
        #[doc = r" Compress requests with `gzip`."]
        #[doc = r""]
        #[doc = r" This requires the server to support it otherwise it might respond with an"]
        #[doc = r" error."]
        pub fn send_gzip(mut self) -> Self {
            self.inner = self.inner.send_gzip();
            self
        }
        #[doc = r" Enable decompressing responses with `gzip`."]
        pub fn accept_gzip(mut self) -> Self {
            self.inner = self.inner.accept_gzip();
            self
        }
        pub async fn register(
            &mut self,
            request: impl tonic::IntoStreamingRequest<Message = super::ProtoClientUpdate>,
        ) -> Result<tonic::Response<tonic::codec::Streaming<super::ProtoClientAck>>, tonic::Status>
        {
            self.inner.ready().await.map_err(|e| {
                tonic::Status::new(
                    tonic::Code::Unknown,
                    format!("Service was not ready: {}", e.into()),
                )
            })?;
            let codec = tonic::codec::ProstCodec::default();
            let path = http::uri::PathAndQuery::from_static("/registry.GrpcRegistry/Register");
            self.inner
                .streaming(request.into_streaming_request(), path, codec)
                .await
        }
        pub async fn subscribe(
            &mut self,
            request: impl tonic::IntoRequest<super::ProtoSubscribeRequest>,
        ) -> Result<tonic::Response<tonic::codec::Streaming<super::ProtoMember>>, tonic::Status>
        {
            self.inner.ready().await.map_err(|e| {
                tonic::Status::new(
                    tonic::Code::Unknown,
                    format!("Service was not ready: {}", e.into()),
                )
            })?;
            let codec = tonic::codec::ProstCodec::default();
            let path = http::uri::PathAndQuery::from_static("/registry.GrpcRegistry/Subscribe");
            self.inner
                .server_streaming(request.into_request(), path, codec)
                .await
        }
        pub async fn member(
            &mut self,
            request: impl tonic::IntoRequest<super::ProtoMemberRequest>,
        ) -> Result<tonic::Response<super::ProtoMemberResponse>, tonic::Status> {
            self.inner.ready().await.map_err(|e| {
                tonic::Status::new(
                    tonic::Code::Unknown,
                    format!("Service was not ready: {}", e.into()),
                )
            })?;
            let codec = tonic::codec::ProstCodec::default();
            let path = http::uri::PathAndQuery::from_static("/registry.GrpcRegistry/Member");
            self.inner.unary(request.into_request(), path, codec).await
        }
        pub async fn members(
            &mut self,
            request: impl tonic::IntoRequest<super::ProtoMembersRequest>,
        ) -> Result<tonic::Response<super::ProtoMembersResponse>, tonic::Status> {
            self.inner.ready().await.map_err(|e| {
                tonic::Status::new(
                    tonic::Code::Unknown,
                    format!("Service was not ready: {}", e.into()),
                )
            })?;
            let codec = tonic::codec::ProstCodec::default();
            let path = http::uri::PathAndQuery::from_static("/registry.GrpcRegistry/Members");
            self.inner.unary(request.into_request(), path, codec).await
        }
    }
}
#[doc = r" Generated client implementations."]
pub mod grpc_replica_client {
    #![allow(unused_variables, dead_code, missing_docs, clippy::let_unit_value)]
    use tonic::codegen::*;
    #[derive(Debug, Clone)]
    pub struct GrpcReplicaClient<T> {
        inner: tonic::client::Grpc<T>,
    }
    impl GrpcReplicaClient<tonic::transport::Channel> {
        #[doc = r" Attempt to create a new client by connecting to a given endpoint."]
        pub async fn connect<D>(dst: D) -> Result<Self, tonic::transport::Error>
        where
            D: std::convert::TryInto<tonic::transport::Endpoint>,
            D::Error: Into<StdError>,
        {
            let conn = tonic::transport::Endpoint::new(dst)?.connect().await?;
            Ok(Self::new(conn))
        }
    }
    impl<T> GrpcReplicaClient<T>
    where
        T: tonic::client::GrpcService<tonic::body::BoxBody>,
        T::ResponseBody: Body + Send + 'static,
        T::Error: Into<StdError>,
        <T::ResponseBody as Body>::Error: Into<StdError> + Send,
    {
        pub fn new(inner: T) -> Self {
            let inner = tonic::client::Grpc::new(inner);
            Self { inner }
        }
        pub fn with_interceptor<F>(
            inner: T,
            interceptor: F,
        ) -> GrpcReplicaClient<InterceptedService<T, F>>
        where
            F: tonic::service::Interceptor,
            T: tonic::codegen::Service<
                http::Request<tonic::body::BoxBody>,
                Response = http::Response<
                    <T as tonic::client::GrpcService<tonic::body::BoxBody>>::ResponseBody,
                >,
            >,
            <T as tonic::codegen::Service<http::Request<tonic::body::BoxBody>>>::Error:
                Into<StdError> + Send + Sync,
        {
            GrpcReplicaClient::new(InterceptedService::new(inner, interceptor))
        }
        #[doc = r" Compress requests with `gzip`."]
        #[doc = r""]
        #[doc = r" This requires the server to support it otherwise it might respond with an"]
        #[doc = r" error."]
        pub fn send_gzip(mut self) -> Self {
            self.inner = self.inner.send_gzip();
            self
        }
        #[doc = r" Enable decompressing responses with `gzip`."]
        pub fn accept_gzip(mut self) -> Self {
            self.inner = self.inner.accept_gzip();
            self
        }
        pub async fn update(
            &mut self,
            request: impl tonic::IntoRequest<super::ProtoUpdateRequest>,
        ) -> Result<tonic::Response<super::ProtoUpdateResponse>, tonic::Status> {
            self.inner.ready().await.map_err(|e| {
                tonic::Status::new(
                    tonic::Code::Unknown,
                    format!("Service was not ready: {}", e.into()),
                )
            })?;
            let codec = tonic::codec::ProstCodec::default();
            let path = http::uri::PathAndQuery::from_static("/registry.GrpcReplica/Update");
            self.inner.unary(request.into_request(), path, codec).await
        }
        pub async fn digest(
            &mut self,
            request: impl tonic::IntoRequest<super::ProtoDigestRequest>,
        ) -> Result<tonic::Response<super::ProtoDigestResponse>, tonic::Status> {
            self.inner.ready().await.map_err(|e| {
                tonic::Status::new(
                    tonic::Code::Unknown,
                    format!("Service was not ready: {}", e.into()),
                )
            })?;
            let codec = tonic::codec::ProstCodec::default();
            let path = http::uri::PathAndQuery::from_static("/registry.GrpcReplica/Digest");
            self.inner.unary(request.into_request(), path, codec).await
        }
    }
}
#[doc = r" Generated server implementations."]
pub mod grpc_registry_server {
    #![allow(unused_variables, dead_code, missing_docs, clippy::let_unit_value)]
    use tonic::codegen::*;
    #[doc = "Generated trait containing gRPC methods that should be implemented for use with GrpcRegistryServer."]
    #[async_trait]
    pub trait GrpcRegistry: Send + Sync + 'static {
        #[doc = "Server streaming response type for the Register method."]
        type RegisterStream: futures_core::Stream<Item = Result<super::ProtoClientAck, tonic::Status>>
            + Send
            + 'static;
        async fn register(
            &self,
            request: tonic::Request<tonic::Streaming<super::ProtoClientUpdate>>,
        ) -> Result<tonic::Response<Self::RegisterStream>, tonic::Status>;
        #[doc = "Server streaming response type for the Subscribe method."]
        type SubscribeStream: futures_core::Stream<Item = Result<super::ProtoMember, tonic::Status>>
            + Send
            + 'static;
        async fn subscribe(
            &self,
            request: tonic::Request<super::ProtoSubscribeRequest>,
        ) -> Result<tonic::Response<Self::SubscribeStream>, tonic::Status>;
        async fn member(
            &self,
            request: tonic::Request<super::ProtoMemberRequest>,
        ) -> Result<tonic::Response<super::ProtoMemberResponse>, tonic::Status>;
        async fn members(
            &self,
            request: tonic::Request<super::ProtoMembersRequest>,
        ) -> Result<tonic::Response<super::ProtoMembersResponse>, tonic::Status>;
    }
    #[derive(Debug)]
    pub struct GrpcRegistryServer<T: GrpcRegistry> {
        inner: _Inner<T>,
        accept_compression_encodings: (),
        send_compression_encodings: (),
    }
    struct _Inner<T>(Arc<T>);
    impl<T: GrpcRegistry> GrpcRegistryServer<T> {
        pub fn new(inner: T) -> Self {
            let inner = Arc::new(inner);
            let inner = _Inner(inner);
            Self {
                inner,
                accept_compression_encodings: Default::default(),
                send_compression_encodings: Default::default(),
            }
        }
        pub fn with_interceptor<F>(inner: T, interceptor: F) -> InterceptedService<Self, F>
        where
            F: tonic::service::Interceptor,
        {
            InterceptedService::new(Self::new(inner), interceptor)
        }
    }
    impl<T, B> tonic::codegen::Service<http::Request<B>> for GrpcRegistryServer<T>
    where
        T: GrpcRegistry,
        B: Body + Send + 'static,
        B::Error: Into<StdError> + Send + 'static,
    {
        type Response = http::Response<tonic::body::BoxBody>;
        type Error = Never;
        type Future = BoxFuture<Self::Response, Self::Error>;
        fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
            Poll::Ready(Ok(()))
        }
        fn call(&mut self, req: http::Request<B>) -> Self::Future {
            let inner = self.inner.clone();
            match req.uri().path() {
                "/registry.GrpcRegistry/Register" => {
                    #[allow(non_camel_case_types)]
                    struct RegisterSvc<T: GrpcRegistry>(pub Arc<T>);
                    impl<T: GrpcRegistry> tonic::server::StreamingService<super::ProtoClientUpdate> for RegisterSvc<T> {
                        type Response = super::ProtoClientAck;
                        type ResponseStream = T::RegisterStream;
                        type Future =
                            BoxFuture<tonic::Response<Self::ResponseStream>, tonic::Status>;
                        fn call(
                            &mut self,
                            request: tonic::Request<tonic::Streaming<super::ProtoClientUpdate>>,
                        ) -> Self::Future {
                            let inner = self.0.clone();
                            let fut = async move { (*inner).register(request).await };
                            Box::pin(fut)
                        }
                    }
                    let accept_compression_encodings = self.accept_compression_encodings;
                    let send_compression_encodings = self.send_compression_encodings;
                    let inner = self.inner.clone();
                    let fut = async move {
                        let inner = inner.0;
                        let method = RegisterSvc(inner);
                        let codec = tonic::codec::ProstCodec::default();
                        let mut grpc = tonic::server::Grpc::new(codec).apply_compression_config(
                            accept_compression_encodings,
                            send_compression_encodings,
                        );
                        let res = grpc.streaming(method, req).await;
                        Ok(res)
                    };
                    Box::pin(fut)
                }
                "/registry.GrpcRegistry/Subscribe" => {
                    #[allow(non_camel_case_types)]
                    struct SubscribeSvc<T: GrpcRegistry>(pub Arc<T>);
                    impl<T: GrpcRegistry>
                        tonic::server::ServerStreamingService<super::ProtoSubscribeRequest>
                        for SubscribeSvc<T>
                    {
                        type Response = super::ProtoMember;
                        type ResponseStream = T::SubscribeStream;
                        type Future =
                            BoxFuture<tonic::Response<Self::ResponseStream>, tonic::Status>;
                        fn call(
                            &mut self,
                            request: tonic::Request<super::ProtoSubscribeRequest>,
                        ) -> Self::Future {
                            let inner = self.0.clone();
                            let fut = async move { (*inner).subscribe(request).await };
                            Box::pin(fut)
                        }
                    }
                    let accept_compression_encodings = self.accept_compression_encodings;
                    let send_compression_encodings = self.send_compression_encodings;
                    let inner = self.inner.clone();
                    let fut = async move {
                        let inner = inner.0;
                        let method = SubscribeSvc(inner);
                        let codec = tonic::codec::ProstCodec::default();
                        let mut grpc = tonic::server::Grpc::new(codec).apply_compression_config(
                            accept_compression_encodings,
                            send_compression_encodings,
                        );
                        let res = grpc.server_streaming(method, req).await;
                        Ok(res)
                    };
                    Box::pin(fut)
                }
                "/registry.GrpcRegistry/Member" => {
                    #[allow(non_camel_case_types)]
                    struct MemberSvc<T: GrpcRegistry>(pub Arc<T>);
                    impl<T: GrpcRegistry> tonic::server::UnaryService<super::ProtoMemberRequest> for MemberSvc<T> {
                        type Response = super::ProtoMemberResponse;
                        type Future = BoxFuture<tonic::Response<Self::Response>, tonic::Status>;
                        fn call(
                            &mut self,
                            request: tonic::Request<super::ProtoMemberRequest>,
                        ) -> Self::Future {
                            let inner = self.0.clone();
                            let fut = async move { (*inner).member(request).await };
                            Box::pin(fut)
                        }
                    }
                    let accept_compression_encodings = self.accept_compression_encodings;
                    let send_compression_encodings = self.send_compression_encodings;
                    let inner = self.inner.clone();
                    let fut = async move {
                        let inner = inner.0;
                        let method = MemberSvc(inner);
                        let codec = tonic::codec::ProstCodec::default();
                        let mut grpc = tonic::server::Grpc::new(codec).apply_compression_config(
                            accept_compression_encodings,
                            send_compression_encodings,
                        );
                        let res = grpc.unary(method, req).await;
                        Ok(res)
                    };
                    Box::pin(fut)
                }
                "/registry.GrpcRegistry/Members" => {
                    #[allow(non_camel_case_types)]
                    struct MembersSvc<T: GrpcRegistry>(pub Arc<T>);
                    impl<T: GrpcRegistry> tonic::server::UnaryService<super::ProtoMembersRequest> for MembersSvc<T> {
                        type Response = super::ProtoMembersResponse;
                        type Future = BoxFuture<tonic::Response<Self::Response>, tonic::Status>;
                        fn call(
                            &mut self,
                            request: tonic::Request<super::ProtoMembersRequest>,
                        ) -> Self::Future {
                            let inner = self.0.clone();
                            let fut = async move { (*inner).members(request).await };
                            Box::pin(fut)
                        }
                    }
                    let accept_compression_encodings = self.accept_compression_encodings;
                    let send_compression_encodings = self.send_compression_encodings;
                    let inner = self.inner.clone();
                    let fut = async move {
                        let inner = inner.0;
                        let method = MembersSvc(inner);
                        let codec = tonic::codec::ProstCodec::default();
                        let mut grpc = tonic::server::Grpc::new(codec).apply_compression_config(
                            accept_compression_encodings,
                            send_compression_encodings,
                        );
                        let res = grpc.unary(method, req).await;
                        Ok(res)
                    };
                    Box::pin(fut)
                }
                _ => Box::pin(async move {
                    Ok(http::Response::builder()
                        .status(200)
                        .header("grpc-status", "12")
                        .header("content-type", "application/grpc")
                        .body(empty_body())
                        .unwrap())
                }),
            }
        }
    }
    impl<T: GrpcRegistry> Clone for GrpcRegistryServer<T> {
        fn clone(&self) -> Self {
            let inner = self.inner.clone();
            Self {
                inner,
                accept_compression_encodings: self.accept_compression_encodings,
                send_compression_encodings: self.send_compression_encodings,
            }
        }
    }
    impl<T: GrpcRegistry> Clone for _Inner<T> {
        fn clone(&self) -> Self {
            Self(self.0.clone())
        }
    }
    impl<T: std::fmt::Debug> std::fmt::Debug for _Inner<T> {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "{:?}", self.0)
        }
    }
    impl<T: GrpcRegistry> tonic::transport::NamedService for GrpcRegistryServer<T> {
        const NAME: &'static str = "registry.GrpcRegistry";
    }
}
#[doc = r" Generated server implementations."]
pub mod grpc_replica_server {
    #![allow(unused_variables, dead_code, missing_docs, clippy::let_unit_value)]
    use tonic::codegen::*;
    #[doc = "Generated trait containing gRPC methods that should be implemented for use with GrpcReplicaServer."]
    #[async_trait]
    pub trait GrpcReplica: Send + Sync + 'static {
        async fn update(
            &self,
            request: tonic::Request<super::ProtoUpdateRequest>,
        ) -> Result<tonic::Response<super::ProtoUpdateResponse>, tonic::Status>;
        async fn digest(
            &self,
            request: tonic::Request<super::ProtoDigestRequest>,
        ) -> Result<tonic::Response<super::ProtoDigestResponse>, tonic::Status>;
    }
    #[derive(Debug)]
    pub struct GrpcReplicaServer<T: GrpcReplica> {
        inner: _Inner<T>,
        accept_compression_encodings: (),
        send_compression_encodings: (),
    }
    struct _Inner<T>(Arc<T>);
    impl<T: GrpcReplica> GrpcReplicaServer<T> {
        pub fn new(inner: T) -> Self {
            let inner = Arc::new(inner);
            let inner = _Inner(inner);
            Self {
                inner,
                accept_compression_encodings: Default::default(),
                send_compression_encodings: Default::default(),
            }
        }
        pub fn with_interceptor<F>(inner: T, interceptor: F) -> InterceptedService<Self, F>
        where
            F: tonic::service::Interceptor,
        {
            InterceptedService::new(Self::new(inner), interceptor)
        }
    }
    impl<T, B> tonic::codegen::Service<http::Request<B>> for GrpcReplicaServer<T>
    where
        T: GrpcReplica,
        B: Body + Send + 'static,
        B::Error: Into<StdError> + Send + 'static,
    {
        type Response = http::Response<tonic::body::BoxBody>;
        type Error = Never;
        type Future = BoxFuture<Self::Response, Self::Error>;
        fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
            Poll::Ready(Ok(()))
        }
        fn call(&mut self, req: http::Request<B>) -> Self::Future {
            let inner = self.inner.clone();
            match req.uri().path() {
                "/registry.GrpcReplica/Update" => {
                    #[allow(non_camel_case_types)]
                    struct UpdateSvc<T: GrpcReplica>(pub Arc<T>);
                    impl<T: GrpcReplica> tonic::server::UnaryService<super::ProtoUpdateRequest> for UpdateSvc<T> {
                        type Response = super::ProtoUpdateResponse;
                        type Future = BoxFuture<tonic::Response<Self::Response>, tonic::Status>;
                        fn call(
                            &mut self,
                            request: tonic::Request<super::ProtoUpdateRequest>,
                        ) -> Self::Future {
                            let inner = self.0.clone();
                            let fut = async move { (*inner).update(request).await };
                            Box::pin(fut)
                        }
                    }
                    let accept_compression_encodings = self.accept_compression_encodings;
                    let send_compression_encodings = self.send_compression_encodings;
                    let inner = self.inner.clone();
                    let fut = async move {
                        let inner = inner.0;
                        let method = UpdateSvc(inner);
                        let codec = tonic::codec::ProstCodec::default();
                        let mut grpc = tonic::server::Grpc::new(codec).apply_compression_config(
                            accept_compression_encodings,
                            send_compression_encodings,
                        );
                        let res = grpc.unary(method, req).await;
                        Ok(res)
                    };
                    Box::pin(fut)
                }
                "/registry.GrpcReplica/Digest" => {
                    #[allow(non_camel_case_types)]
                    struct DigestSvc<T: GrpcReplica>(pub Arc<T>);
                    impl<T: GrpcReplica> tonic::server::UnaryService<super::ProtoDigestRequest> for DigestSvc<T> {
                        type Response = super::ProtoDigestResponse;
                        type Future = BoxFuture<tonic::Response<Self::Response>, tonic::Status>;
                        fn call(
                            &mut self,
                            request: tonic::Request<super::ProtoDigestRequest>,
                        ) -> Self::Future {
                            let inner = self.0.clone();
                            let fut = async move { (*inner).digest(request).await };
                            Box::pin(fut)
                        }
                    }
                    let accept_compression_encodings = self.accept_compression_encodings;
                    let send_compression_encodings = self.send_compression_encodings;
                    let inner = self.inner.clone();
                    let fut = async move {
                        let inner = inner.0;
                        let method = DigestSvc(inner);
                        let codec = tonic::codec::ProstCodec::default();
                        let mut grpc = tonic::server::Grpc::new(codec).apply_compression_config(
                            accept_compression_encodings,
                            send_compression_encodings,
                        );
                        let res = grpc.unary(method, req).await;
                        Ok(res)
                    };
                    Box::pin(fut)
                }
                _ => Box::pin(async move {
                    Ok(http::Response::builder()
                        .status(200)
                        .header("grpc-status", "12")
                        .header("content-type", "application/grpc")
                        .body(empty_body())
                        .unwrap())
                }),
            }
        }
    }
    impl<T: GrpcReplica> Clone for GrpcReplicaServer<T> {
        fn clone(&self) -> Self {
            let inner = self.inner.clone();
            Self {
                inner,
                accept_compression_encodings: self.accept_compression_encodings,
                send_compression_encodings: self.send_compression_encodings,
            }
        }
    }
    impl<T: GrpcReplica> Clone for _Inner<T> {
        fn clone(&self) -> Self {
            Self(self.0.clone())
        }
    }
    impl<T: std::fmt::Debug> std::fmt::Debug for _Inner<T> {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "{:?}", self.0)
        }
    }
    impl<T: GrpcReplica> tonic::transport::NamedService for GrpcReplicaServer<T> {
        const NAME: &'static str = "registry.GrpcReplica";
    }
}
